pub mod dynamo;
pub mod memory;
pub mod repo;
pub mod runs;
pub mod steps;
pub mod test_cases;
