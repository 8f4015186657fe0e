// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Argument destructuring helpers shared by tool handlers.

use serde_json::Value;

use masc_core::RoomError;

pub(crate) fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

pub(crate) fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, RoomError> {
    str_arg(args, key).ok_or_else(|| RoomError::Validation(format!("missing argument: {key}")))
}

pub(crate) fn u64_arg(args: &Value, key: &str) -> Option<u64> {
    args.get(key).and_then(Value::as_u64)
}

pub(crate) fn i64_arg(args: &Value, key: &str) -> Option<i64> {
    args.get(key).and_then(Value::as_i64)
}

pub(crate) fn required_i64(args: &Value, key: &str) -> Result<i64, RoomError> {
    i64_arg(args, key).ok_or_else(|| RoomError::Validation(format!("missing argument: {key}")))
}

pub(crate) fn string_list(args: &Value, key: &str) -> Vec<String> {
    args.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items.iter().filter_map(Value::as_str).map(str::to_string).collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
