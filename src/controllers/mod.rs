pub mod narrate;
