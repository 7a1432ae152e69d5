mod utils;
mod writer_tests;
