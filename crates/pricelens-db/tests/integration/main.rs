mod common;

mod backend_tests;
