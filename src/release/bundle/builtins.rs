//! Node built-in module allow-list.
//!
//! Bare imports of these names are rewritten to `node:{name}` and left
//! external, so the runtime resolves them natively instead of the bundler
//! trying to inline them.

/// Built-in modules that get the `node:` prefix.
pub const NODE_BUILTINS: &[&str] = &[
    "assert",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "https",
    "module",
    "net",
    "os",
    "path",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "timers",
    "tls",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "zlib",
    "worker_threads",
    "inspector",
];

/// Namespace prefix the runtime requires for built-ins.
pub const NODE_NAMESPACE: &str = "node";

/// Bare specifiers must look like `[a-z0-9_]+` to be considered at all.
fn is_bare_name(specifier: &str) -> bool {
    !specifier.is_empty()
        && specifier
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// Returns the namespaced form of a bare built-in import, or `None` when the
/// bundler should resolve `specifier` normally.
pub fn rewrite_builtin(specifier: &str) -> Option<String> {
    (is_bare_name(specifier) && NODE_BUILTINS.contains(&specifier))
        .then(|| format!("{NODE_NAMESPACE}:{specifier}"))
}

/// esbuild `--alias` flags implementing [`rewrite_builtin`] for every built-in.
pub fn alias_flags() -> impl Iterator<Item = String> {
    NODE_BUILTINS.iter().filter_map(|name| {
        rewrite_builtin(name).map(|rewritten| format!("--alias:{name}={rewritten}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_known_builtins() {
        assert_eq!(rewrite_builtin("fs").as_deref(), Some("node:fs"));
        assert_eq!(rewrite_builtin("worker_threads").as_deref(), Some("node:worker_threads"));
        assert_eq!(rewrite_builtin("v8").as_deref(), Some("node:v8"));
    }

    #[test]
    fn leaves_everything_else_alone() {
        assert_eq!(rewrite_builtin("node:fs"), None);
        assert_eq!(rewrite_builtin("fs/promises"), None);
        assert_eq!(rewrite_builtin("lodash"), None);
        assert_eq!(rewrite_builtin("FS"), None);
        assert_eq!(rewrite_builtin(""), None);
    }

    #[test]
    fn one_alias_per_builtin() {
        let flags: Vec<String> = alias_flags().collect();
        assert_eq!(flags.len(), NODE_BUILTINS.len());
        assert!(flags.contains(&"--alias:child_process=node:child_process".to_string()));
    }
}
