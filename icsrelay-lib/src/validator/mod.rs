mod validator_main;

pub(crate) use validator_main::TokenValidator;
