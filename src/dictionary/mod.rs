pub mod token_dictionary;
