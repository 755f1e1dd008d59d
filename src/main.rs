use std::env;

use droptrack::sheet;
use droptrack::store::AirdropStore;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: droptrack <airdrops.csv> [search term]");
        return Ok(());
    }

    // Import the CSV into a fresh store
    let report = sheet::from_csv(&args[1])?;
    for skip in &report.skipped {
        eprintln!("Row {} skipped: {}", skip.row, skip.reason);
    }

    let mut store = AirdropStore::new();
    let added = store.bulk_add("guest", report.inputs);
    println!("{} airdrops imported", added);

    if args.len() >= 3 {
        store.set_search_term(&args[2]);
    }

    for record in store.visible() {
        let deadline = record
            .deadline
            .and_then(sheet::format_date)
            .unwrap_or_else(|| "-".to_string());
        let done = record.tasks.iter().filter(|t| t.completed).count();
        println!(
            "[{:<9}] {}  deadline: {}  tasks: {}/{}",
            record.status.as_str(),
            record.name,
            deadline,
            done,
            record.tasks.len()
        );
    }

    Ok(())
}
