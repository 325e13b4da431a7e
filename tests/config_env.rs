use taskhook::{Config, ALLOW_FOREIGN_HOOK_ENV};

// Kept in its own test binary: it mutates the process environment.
#[test]
fn foreign_hook_toggle_is_read_from_env() {
    std::env::remove_var(ALLOW_FOREIGN_HOOK_ENV);
    assert!(!Config::from_env().allow_foreign_hook);

    for on in ["1", "true", "True"] {
        std::env::set_var(ALLOW_FOREIGN_HOOK_ENV, on);
        assert!(Config::from_env().allow_foreign_hook, "{on:?} should enable");
    }
    for off in ["0", "false", "yes"] {
        std::env::set_var(ALLOW_FOREIGN_HOOK_ENV, off);
        assert!(!Config::from_env().allow_foreign_hook, "{off:?} should not enable");
    }
    std::env::remove_var(ALLOW_FOREIGN_HOOK_ENV);

    let cfg = Config::from_env();
    assert!(cfg.intrusive_cancel);
    assert_eq!(cfg.thread_name, "taskhook");
}
