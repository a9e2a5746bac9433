//! `cargo xtask ci`, `cargo xtask coverage` and friends.

fn main() -> Result<(), anyhow::Error> {
    xtaskops::tasks::main()
}
