pub mod a001_procedure;
