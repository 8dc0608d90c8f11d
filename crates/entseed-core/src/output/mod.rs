pub mod copy;
pub mod csv;

pub use csv::TableFile;
