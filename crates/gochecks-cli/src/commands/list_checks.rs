//! List checks command implementation.

use gochecks_rules::all_checks;

/// Runs the list-checks command.
pub fn run() {
    println!("Available checks:\n");
    println!("{:<10} {:<15} Description", "Code", "Name");
    println!("{}", "-".repeat(80));

    for check in all_checks() {
        println!(
            "{:<10} {:<15} {}",
            check.code(),
            check.name(),
            check.description()
        );
    }

    println!("\nUse --checks to run specific checks, e.g.:");
    println!("  gochecks check --checks extimport,novendor");
    println!("  gochecks check --checks GC001,GC004");
    println!("\nGC005 needs [checks.gogenerate.generators]; run them with `gochecks gogenerate`.");
}
