//! Print the catalogued operations of both API families.
//!
//! Run:
//! `cargo run --example list_operations`

use growi_client::ApiFamily;

fn main() {
    for family in [ApiFamily::V1, ApiFamily::V3] {
        println!("# {family}");
        for operation in family.operations() {
            println!(
                "{:<20} {:<6} {}{}",
                operation.operation_id,
                operation.method,
                family.suffix(),
                operation.path_template
            );
        }
    }
}
