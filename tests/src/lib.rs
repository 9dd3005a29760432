#![cfg(test)]

mod diagnostics;
mod support;
