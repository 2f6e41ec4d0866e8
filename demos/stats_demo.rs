use clap::Parser;
use prime_probe::Table;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "target_capacity", default_value_t = 1000)]
    target_capacity: usize,

    /// Fraction of inserted keys to remove afterwards, leaving tombstones.
    #[arg(short = 'r', long = "remove_fraction", default_value_t = 0.25)]
    remove_fraction: f64,

    /// Print every slot when the table has at most this many.
    #[arg(long = "show_limit", default_value_t = 64)]
    show_limit: usize,
}

fn main() -> Result<(), prime_probe::Error> {
    let args = Args::parse();

    println!(
        "Creating Table with target capacity: {}",
        args.target_capacity
    );

    let mut table: Table<u64, String> = Table::with_capacity(args.target_capacity)?;
    let initial_capacity = table.capacity();

    println!("Actual capacity: {}", initial_capacity);
    println!("Filling table with u64 keys...");

    let num_values = args.target_capacity as u64;
    let mut num_resizes = 0;
    for key in 0..num_values {
        let capacity = table.capacity();
        table.insert(key, format!("value_{key}"))?;
        if table.capacity() != capacity {
            num_resizes += 1;
            println!(
                "Grew from {} to {} slots at {} entries",
                capacity,
                table.capacity(),
                table.len()
            );
        }
    }

    println!("Inserted {} values into table", table.len());
    println!("Resizes: {num_resizes}");
    println!("Final load factor: {:.2}%", table.load() * 100.0);
    table.debug_stats().print();

    let to_remove = (num_values as f64 * args.remove_fraction.clamp(0.0, 1.0)) as u64;
    for key in 0..to_remove {
        table.remove(&key)?;
    }

    println!("Removed {to_remove} values");
    table.debug_stats().print();

    if table.capacity() <= args.show_limit {
        table.show_entries();
    }

    Ok(())
}
