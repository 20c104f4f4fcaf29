pub mod config_tests;
pub mod orchestrator_tests;
pub mod registry_tests;
pub mod scanner_tests;
pub mod translator_tests;
