mod roundtrip;
mod template;
