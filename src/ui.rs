use anyhow::{Context, Result};
use console::{Style, Term};
use credhash::{HashRecord, HasherConfig, KdfParams};
use indicatif::{ProgressBar, ProgressStyle};
use rpassword::prompt_password;
use std::io;
use std::time::{Duration, Instant};
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

pub const MIN_SAFE_PBKDF2_SHA1_ITERATIONS: u32 = 1_300_000;
pub const MIN_SAFE_ARGON2_MEMORY_MIB: u32 = 19;
pub const MIN_SAFE_ARGON2_ITERATIONS: u32 = 2;

pub const MIN_SAFE_SALT_BYTES: usize = 16;
pub const MIN_SAFE_KEY_BYTES: usize = 16;

pub const MAX_SECRET_BYTES: usize = 1024 * 1024;

pub struct DisplayOptions {
    pub unicode_support: bool,
    pub color_support: bool,
    pub quiet: bool,
}

/// Which parts of a record meet current recommendations.
#[derive(Debug, PartialEq, Eq)]
pub struct Assessment {
    pub cost_secure: bool,
    pub salt_secure: bool,
    pub key_secure: bool,
}

impl Assessment {
    pub fn of(record: &HashRecord) -> Self {
        let cost_secure = match *record.params() {
            KdfParams::Pbkdf2Sha1 { iterations } => iterations >= MIN_SAFE_PBKDF2_SHA1_ITERATIONS,
            KdfParams::Argon2id {
                memory_kib,
                iterations,
                ..
            } => {
                memory_kib / 1024 >= MIN_SAFE_ARGON2_MEMORY_MIB
                    && iterations >= MIN_SAFE_ARGON2_ITERATIONS
            }
        };

        Self {
            cost_secure,
            salt_secure: record.salt().len() >= MIN_SAFE_SALT_BYTES,
            key_secure: record.derived_key().len() >= MIN_SAFE_KEY_BYTES,
        }
    }

    pub fn is_secure(&self) -> bool {
        self.cost_secure && self.salt_secure && self.key_secure
    }
}

pub fn detect_unicode_support() -> bool {
    supports_unicode::on(supports_unicode::Stream::Stdout)
}

pub fn detect_color_support() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

pub fn get_status_symbols(unicode_support: bool) -> (&'static str, &'static str) {
    if unicode_support {
        ("✓", "!")
    } else {
        ("+", "!")
    }
}

fn get_tree_branches(unicode_support: bool) -> (&'static str, &'static str) {
    if unicode_support {
        ("├─", "└─")
    } else {
        ("|-", "`-")
    }
}

fn status_style(secure: bool, options: &DisplayOptions) -> Style {
    if !options.color_support {
        Style::new()
    } else if secure {
        Style::new().green()
    } else {
        Style::new().yellow()
    }
}

fn plural(count: usize, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 { one } else { many }
}

fn validate_control_characters(s: &str, input_name: &str) -> Result<()> {
    let control_chars: Vec<usize> = s
        .chars()
        .enumerate()
        .filter(|(_, c)| c.is_control())
        .map(|(pos, _)| pos)
        .collect();

    if !control_chars.is_empty() {
        let term = Term::stderr();

        let warning_msg = format!(
            "WARNING: {} contains {} control character(s) at position(s): {}",
            input_name,
            control_chars.len(),
            control_chars
                .iter()
                .map(|pos| pos.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        term.write_line(&warning_msg)?;
        term.write_str("Continue anyway? [y/N]: ")?;
        term.flush()?;

        let mut response = String::new();
        io::stdin().read_line(&mut response)?;
        let response = response.trim().to_lowercase();

        term.clear_last_lines(2)?;

        if response != "y" && response != "yes" {
            anyhow::bail!("Aborted");
        }
    }

    Ok(())
}

// Whitespace is significant in a secret, so unlike other inputs it is never trimmed.
fn normalize_secret(s: &str, normalize: bool) -> String {
    if normalize {
        s.nfc().collect()
    } else {
        s.to_string()
    }
}

pub fn prompt_secret(label: &str, normalize: bool) -> Result<Zeroizing<String>> {
    let raw = Zeroizing::new(
        prompt_password(format!("{label}: ")).with_context(|| format!("Failed to read {label}"))?,
    );

    let secret = Zeroizing::new(normalize_secret(&raw, normalize));

    if secret.len() > MAX_SECRET_BYTES {
        anyhow::bail!(
            "{} too long ({} bytes, maximum is {})",
            label,
            secret.len(),
            MAX_SECRET_BYTES
        );
    }

    validate_control_characters(&secret, label)?;

    Ok(secret)
}

pub fn prompt_new_secret(normalize: bool) -> Result<Zeroizing<String>> {
    let secret = prompt_secret("Secret", normalize)?;
    let confirmation = prompt_secret("Confirm", normalize)?;

    if *secret != *confirmation {
        anyhow::bail!("Secrets do not match");
    }

    Ok(secret)
}

pub fn show_progress<F, T>(
    unicode_support: bool,
    message: &'static str,
    f: F,
) -> Result<(T, Duration)>
where
    F: FnOnce() -> Result<T>,
{
    let term = Term::stderr();
    term.hide_cursor().ok();

    let pb = ProgressBar::new_spinner();

    if unicode_support {
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
    } else {
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("-\\|/-"),
        );
    }

    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));

    let start = Instant::now();
    let result = f();
    let elapsed = start.elapsed();

    pb.finish_and_clear();
    term.show_cursor().ok();

    result.map(|r| (r, elapsed))
}

pub fn display_created(
    encoded: &str,
    record: &HashRecord,
    elapsed: Duration,
    options: &DisplayOptions,
) {
    if options.quiet {
        println!("{encoded}");
        return;
    }

    println!("Record:\n{encoded}\n");
    display_settings(record, options);
    let (_, last) = get_tree_branches(options.unicode_support);
    println!("  {last} Time       {:.2}s", elapsed.as_secs_f64());
    display_security(&Assessment::of(record), options);
}

pub fn display_verdict(matched: bool, elapsed: Duration, options: &DisplayOptions) {
    let (check_ok, check_warn) = get_status_symbols(options.unicode_support);

    if options.quiet {
        println!("{}", if matched { "match" } else { "mismatch" });
        return;
    }

    let style = if !options.color_support {
        Style::new()
    } else if matched {
        Style::new().green()
    } else {
        Style::new().red()
    };

    let (status, text) = if matched {
        (check_ok, "Secret matches")
    } else {
        (check_warn, "Secret does not match")
    };

    println!(
        "{} {} ({:.2}s)",
        style.apply_to(format!("[{status}]")),
        style.apply_to(text),
        elapsed.as_secs_f64()
    );
}

pub fn display_inspection(
    record: &HashRecord,
    target: &HasherConfig,
    rehash: bool,
    options: &DisplayOptions,
) {
    if options.quiet {
        println!("{}", if rehash { "rehash" } else { "current" });
        return;
    }

    display_settings(record, options);

    let (check_ok, check_warn) = get_status_symbols(options.unicode_support);
    let (_, last) = get_tree_branches(options.unicode_support);
    let style = status_style(!rehash, options);

    println!(
        "  {} Target     {} {} ({})",
        last,
        style.apply_to(format!("[{}]", if rehash { check_warn } else { check_ok })),
        target.params.name(),
        if rehash { "re-hash on next login" } else { "up to date" }
    );

    display_security(&Assessment::of(record), options);
}

fn display_settings(record: &HashRecord, options: &DisplayOptions) {
    let (check_ok, check_warn) = get_status_symbols(options.unicode_support);
    let (branch, _) = get_tree_branches(options.unicode_support);
    let assessment = Assessment::of(record);

    let cost_style = status_style(assessment.cost_secure, options);
    let salt_style = status_style(assessment.salt_secure, options);
    let key_style = status_style(assessment.key_secure, options);

    let symbol = |secure: bool| format!("[{}]", if secure { check_ok } else { check_warn });

    println!("Settings:");

    match *record.params() {
        KdfParams::Pbkdf2Sha1 { iterations } => println!(
            "  {} KDF        {} {} (c={})",
            branch,
            cost_style.apply_to(symbol(assessment.cost_secure)),
            record.params().name(),
            cost_style.apply_to(iterations)
        ),
        KdfParams::Argon2id {
            memory_kib,
            iterations,
            parallelism,
        } => println!(
            "  {} KDF        {} {} (m={} MiB, t={}, p={})",
            branch,
            cost_style.apply_to(symbol(assessment.cost_secure)),
            record.params().name(),
            cost_style.apply_to(memory_kib / 1024),
            cost_style.apply_to(iterations),
            parallelism
        ),
    }

    let salt_len = record.salt().len();
    println!(
        "  {} Salt       {} {} {}",
        branch,
        salt_style.apply_to(symbol(assessment.salt_secure)),
        salt_style.apply_to(salt_len),
        plural(salt_len, "byte", "bytes")
    );

    let key_len = record.derived_key().len();
    println!(
        "  {} Key        {} {} {}",
        branch,
        key_style.apply_to(symbol(assessment.key_secure)),
        key_style.apply_to(key_len),
        plural(key_len, "byte", "bytes")
    );
}

fn display_security(assessment: &Assessment, options: &DisplayOptions) {
    let (check_ok, check_warn) = get_status_symbols(options.unicode_support);
    let secure = assessment.is_secure();
    let style = status_style(secure, options);

    println!(
        "\n{} Security: {}",
        style.apply_to(format!("[{}]", if secure { check_ok } else { check_warn })),
        style.apply_to(if secure { "Strong" } else { "Weak" })
    );
}
