#![no_main]

use basecamp_redmine::config::ImportConfig;
use basecamp_redmine::emit::NullSink;
use basecamp_redmine::run_import;
use basecamp_redmine::storage::MemoryStore;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let mut store = MemoryStore::new();
    let config = ImportConfig::default();
    if run_import(&mut store, &config, text, &mut NullSink).is_ok() {
        let again = run_import(&mut store, &config, text, &mut NullSink)
            .expect("second run of an accepted export must succeed");
        assert_eq!(again.stats.projects.created, 0);
        assert_eq!(again.stats.messages.created, 0);
        assert_eq!(again.stats.issues.created, 0);
    }
});
