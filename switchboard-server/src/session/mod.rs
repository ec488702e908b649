mod call_table;

pub use call_table::*;
