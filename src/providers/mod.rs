pub mod coinmarketcap;
#[cfg(test)]
pub mod fixed;
