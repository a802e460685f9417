//! Basic usage examples for veb-rs.
//!
//! Run with `RUST_LOG=trace` to see cluster allocation.

use veb_rs::{VebError, VebTree};

fn main() -> Result<(), VebError> {
    env_logger::init();

    example_small_universe()?;
    example_enumeration()?;
    example_errors();
    Ok(())
}

fn example_small_universe() -> Result<(), VebError> {
    println!("=== Universe of 8 ===\n");

    let mut tree = VebTree::new(8)?;
    for v in [1, 3, 7] {
        tree.insert(v)?;
    }

    println!("member(3) = {}", tree.member(3)?);
    println!("member(4) = {}", tree.member(4)?);
    println!("successor(0) = {:?}", tree.successor(0)?);
    println!("successor(1) = {:?}", tree.successor(1)?);
    println!("successor(3) = {:?}", tree.successor(3)?);
    println!("successor(7) = {:?}\n", tree.successor(7)?);
    Ok(())
}

fn example_enumeration() -> Result<(), VebError> {
    println!("=== Successor walk over 2^32 ===\n");

    let tree = VebTree::from_values(1 << 32, [4_000_000_000, 17, 65_536, 17, 900])?;
    println!("len = {}, min = {:?}, max = {:?}", tree.len(), tree.min(), tree.max());
    println!("values = {:?}", tree);
    println!("approx memory = {} bytes\n", tree.memory_usage());
    Ok(())
}

fn example_errors() {
    println!("=== Errors ===\n");

    if let Err(e) = VebTree::new(5) {
        println!("new(5): {e}");
    }
    if let Ok(mut tree) = VebTree::new(16) {
        if let Err(e) = tree.insert(16) {
            println!("insert(16): {e}");
        }
    }
}
