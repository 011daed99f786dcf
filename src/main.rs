// Interactive menu driver over the collection core.
//
// Thin glue only: every operation here calls straight into the library
// surface. Input mistakes re-prompt; library errors print and return to
// the menu. The process never aborts on a failed operation.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use car_collection::{
    export_csv, handle, import_csv, load_binary, save_binary, Car, CarType, Collection, Condition,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Model-Car Collection Manager v{}", car_collection::VERSION);

    let mut collection = Collection::named("My Garage");

    loop {
        print_menu();
        match read_line("Choice: ")?.as_str() {
            "1" => add_car(&mut collection)?,
            "2" => remove_car(&mut collection)?,
            "3" => edit_car(&mut collection)?,
            "4" => println!("\n{}", collection),
            "5" => find_by_manufacturer(&collection)?,
            "6" => filter_by_condition(&collection)?,
            "7" => filter_by_type(&collection)?,
            "8" => sort_collection(&mut collection)?,
            "9" => group_collection(&collection)?,
            "10" => valuation_report(&collection),
            "11" => export_text(&collection)?,
            "12" => import_text(&mut collection)?,
            "13" => save_bin(&collection)?,
            "14" => load_bin(&mut collection)?,
            "0" => break,
            other => println!("Unknown option: {other}"),
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn print_menu() {
    println!("\n=== Menu ===");
    println!(" 1. Add a car");
    println!(" 2. Remove a car");
    println!(" 3. Edit a car");
    println!(" 4. Show the collection");
    println!(" 5. Find by manufacturer");
    println!(" 6. Filter by condition");
    println!(" 7. Filter by type");
    println!(" 8. Sort");
    println!(" 9. Group");
    println!("10. Valuation report");
    println!("11. Export to text file");
    println!("12. Import from text file");
    println!("13. Save to binary file");
    println!("14. Load from binary file");
    println!(" 0. Exit");
}

// ============================================================================
// INPUT HELPERS
// ============================================================================

fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn read_i32(prompt: &str) -> Result<i32> {
    loop {
        match read_line(prompt)?.parse() {
            Ok(value) => return Ok(value),
            Err(_) => println!("Please enter a whole number."),
        }
    }
}

fn read_f64(prompt: &str) -> Result<f64> {
    loop {
        match read_line(prompt)?.parse() {
            Ok(value) => return Ok(value),
            Err(_) => println!("Please enter a number."),
        }
    }
}

fn read_index(prompt: &str) -> Result<usize> {
    loop {
        match read_line(prompt)?.parse::<usize>() {
            // Menus are 1-based, the container is 0-based
            Ok(value) if value > 0 => return Ok(value - 1),
            _ => println!("Please enter a record number starting from 1."),
        }
    }
}

fn read_yes_no(prompt: &str) -> Result<bool> {
    Ok(matches!(
        read_line(prompt)?.to_lowercase().as_str(),
        "y" | "yes"
    ))
}

fn choose_type() -> Result<CarType> {
    println!("Car type:");
    for (i, t) in CarType::ALL.iter().enumerate() {
        println!("{}. {}", i + 1, t);
    }
    loop {
        let choice = read_index("Type: ")?;
        if let Some(t) = CarType::ALL.get(choice) {
            return Ok(*t);
        }
        println!("Please pick one of the listed types.");
    }
}

fn choose_condition() -> Result<Condition> {
    println!("Condition:");
    for (i, c) in Condition::ALL.iter().enumerate() {
        println!("{}. {}", i + 1, c);
    }
    loop {
        let choice = read_index("Condition: ")?;
        if let Some(c) = Condition::ALL.get(choice) {
            return Ok(*c);
        }
        println!("Please pick one of the listed conditions.");
    }
}

fn prompt_car() -> Result<Car> {
    let manufacturer = read_line("Manufacturer: ")?;
    let model = read_line("Model: ")?;
    let year = read_i32("Year: ")?;
    let price = read_f64("Price: ")?;
    let car_type = choose_type()?;
    let condition = choose_condition()?;
    let scale = read_line("Scale (e.g. 1:18): ")?;
    let color = read_line("Color: ")?;
    let limited = read_yes_no("Limited edition? (y/n): ")?;

    Ok(Car::new(
        manufacturer,
        model,
        year,
        price,
        car_type,
        condition,
        scale,
        color,
        limited,
    ))
}

fn prompt_path(prompt: &str) -> Result<PathBuf> {
    Ok(PathBuf::from(read_line(prompt)?))
}

// ============================================================================
// MENU ACTIONS
// ============================================================================

fn add_car(collection: &mut Collection<Car>) -> Result<()> {
    println!("\n=== Add a car ===");
    collection.add(handle(prompt_car()?));
    println!("Car added.");
    Ok(())
}

fn remove_car(collection: &mut Collection<Car>) -> Result<()> {
    if collection.is_empty() {
        println!("The collection is empty.");
        return Ok(());
    }
    let index = read_index("Record number to remove: ")?;
    match collection.remove_at(index) {
        Ok(_) => println!("Car removed."),
        Err(err) => println!("Error: {err}"),
    }
    Ok(())
}

fn edit_car(collection: &mut Collection<Car>) -> Result<()> {
    if collection.is_empty() {
        println!("The collection is empty.");
        return Ok(());
    }
    let index = read_index("Record number to edit: ")?;
    match collection.at(index) {
        Ok(current) => {
            println!("\nCurrent record:\n{}", current.borrow());
            println!("\nEnter the replacement record:");
        }
        Err(err) => {
            println!("Error: {err}");
            return Ok(());
        }
    }
    let replacement = handle(prompt_car()?);
    match collection.edit_at(index, replacement) {
        Ok(()) => println!("Car updated."),
        Err(err) => println!("Error: {err}"),
    }
    Ok(())
}

fn find_by_manufacturer(collection: &Collection<Car>) -> Result<()> {
    let name = read_line("Manufacturer: ")?;
    let matches = collection.find_by_manufacturer(&name);
    print_handles(&matches, &format!("records by {name}"));
    Ok(())
}

fn filter_by_condition(collection: &Collection<Car>) -> Result<()> {
    let condition = choose_condition()?;
    let matches = collection.filter_by_condition(condition);
    print_handles(&matches, &format!("records in {condition} condition"));
    Ok(())
}

fn filter_by_type(collection: &Collection<Car>) -> Result<()> {
    let car_type = choose_type()?;
    let matches = collection.filter_by_type(car_type);
    print_handles(&matches, &format!("{car_type} records"));
    Ok(())
}

fn print_handles(handles: &[car_collection::Handle<Car>], what: &str) {
    if handles.is_empty() {
        println!("No {what} found.");
        return;
    }
    println!("\nFound {} {what}:", handles.len());
    for (i, item) in handles.iter().enumerate() {
        println!("\n{}. {}", i + 1, item.borrow());
    }
}

fn sort_collection(collection: &mut Collection<Car>) -> Result<()> {
    println!("Sort by: 1. Year  2. Price  3. Manufacturer");
    let key = read_line("Key: ")?;
    let ascending = read_yes_no("Ascending? (y/n): ")?;
    match key.as_str() {
        "1" => collection.sort_by_year(ascending),
        "2" => collection.sort_by_price(ascending),
        "3" => collection.sort_by_manufacturer(ascending),
        other => {
            println!("Unknown sort key: {other}");
            return Ok(());
        }
    }
    println!("Sorted.");
    Ok(())
}

fn group_collection(collection: &Collection<Car>) -> Result<()> {
    println!("Group by: 1. Manufacturer  2. Type  3. Condition");
    match read_line("Key: ")?.as_str() {
        "1" => {
            for (key, bucket) in collection.group_by_manufacturer() {
                println!("\n-- {key} ({} records) --", bucket.len());
                for item in &bucket {
                    println!("{}\n", item.borrow());
                }
            }
        }
        "2" => {
            for (key, bucket) in collection.group_by_type() {
                println!("\n-- {key} ({} records) --", bucket.len());
                for item in &bucket {
                    println!("{}\n", item.borrow());
                }
            }
        }
        "3" => {
            for (key, bucket) in collection.group_by_condition() {
                println!("\n-- {key} ({} records) --", bucket.len());
                for item in &bucket {
                    println!("{}\n", item.borrow());
                }
            }
        }
        other => println!("Unknown group key: {other}"),
    }
    Ok(())
}

fn valuation_report(collection: &Collection<Car>) {
    if collection.is_empty() {
        println!("The collection is empty.");
        return;
    }
    println!("\n=== Valuation report ===");
    for (i, item) in collection.iter().enumerate() {
        let car = item.borrow();
        println!(
            "{}. {} {} ({}): price {:.2}, estimated value {:.2}{}",
            i + 1,
            car.manufacturer,
            car.model,
            car.year,
            car.price,
            car.calculate_value(),
            if car.is_valuable() { " [valuable]" } else { "" }
        );
    }
    println!("Raw total: {:.2}", collection.total_value());
}

fn export_text(collection: &Collection<Car>) -> Result<()> {
    let path = prompt_path("Destination file: ")?;
    match export_csv(collection, &path) {
        Ok(()) => println!("Exported {} records to {}.", collection.len(), path.display()),
        Err(err) => println!("Export failed: {err}"),
    }
    Ok(())
}

fn import_text(collection: &mut Collection<Car>) -> Result<()> {
    let path = prompt_path("Source file: ")?;
    match import_csv(collection, &path) {
        Ok(report) => {
            println!("Imported {} records.", report.imported);
            for issue in &report.skipped {
                println!("  line {}: {}", issue.line, issue.reason);
            }
        }
        Err(err) => println!("Import failed: {err}"),
    }
    Ok(())
}

fn save_bin(collection: &Collection<Car>) -> Result<()> {
    let path = prompt_path("Destination file: ")?;
    match save_binary(collection, &path) {
        Ok(()) => println!("Saved {} records to {}.", collection.len(), path.display()),
        Err(err) => println!("Save failed: {err}"),
    }
    Ok(())
}

fn load_bin(collection: &mut Collection<Car>) -> Result<()> {
    let path = prompt_path("Source file: ")?;
    match load_binary(collection, &path) {
        Ok(appended) => println!("Loaded {appended} records."),
        Err(err) => println!("Load failed: {err}"),
    }
    Ok(())
}
