pub(crate) mod bootstrap;
pub(crate) mod input_script;
pub(crate) mod loop_runner;
