pub mod env_record;
pub mod error;
pub mod function_object;
pub mod lex_env;
pub mod object;
pub mod value;

pub mod operations {
    pub mod lex_env;
    pub mod object;
    pub mod test_and_comparison;
    pub mod type_conversion;
}
