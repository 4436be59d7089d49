/// Primary keys of both tables are PostgreSQL SERIAL.
pub type DbId = i32;
