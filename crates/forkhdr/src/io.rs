pub use bitcoin::io::{Cursor, Error, Read, Write};
