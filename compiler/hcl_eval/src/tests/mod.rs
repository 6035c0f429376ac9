//! Tests that cut across modules.
