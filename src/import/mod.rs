mod csv_import;

pub(crate) use csv_import::{parse, read_file, EXAMPLE_CSV};
