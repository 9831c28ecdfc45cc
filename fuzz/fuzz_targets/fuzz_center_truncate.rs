#![no_main]

use basecamp_redmine::util::text::center_truncate;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (String, u8)| {
    let (text, limit) = input;
    let limit = usize::from(limit);
    match center_truncate(&text, limit, "...") {
        Ok(out) if text.chars().count() <= limit => assert_eq!(out, text),
        Ok(out) => {
            assert_eq!(out.chars().count(), limit);
            assert!(out.contains("..."));
        }
        Err(_) => assert!(limit < 3 && text.chars().count() > limit),
    }
});
