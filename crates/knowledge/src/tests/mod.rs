//! Cross-module tests: index build round trip and the full answer pipeline.

mod support;
