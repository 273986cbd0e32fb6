use anyhow::{Result, bail};
use std::io::{self, BufRead, IsTerminal};
use zeroize::Zeroizing;

/// Environment variable holding the current PIN.
pub const PIN_ENV: &str = "PINSEAL_PIN";
/// Environment variable holding the replacement PIN for `rekey`.
pub const NEW_PIN_ENV: &str = "PINSEAL_NEW_PIN";

/// Reads the current PIN.
///
/// Sources, first match wins:
/// - `PINSEAL_PIN="1234" pinseal decrypt`
/// - `echo 1234 | pinseal decrypt`
/// - interactive prompt
pub fn read_pin() -> Result<Zeroizing<String>> {
    if let Some(pin) = pin_from_env(PIN_ENV) {
        return Ok(pin);
    }

    let stdin = io::stdin();
    if !stdin.is_terminal() {
        let pin = read_line(&mut stdin.lock())?;
        if !pin.is_empty() {
            return Ok(pin);
        }
        bail!("No PIN provided");
    }

    let pin = Zeroizing::new(rpassword::prompt_password("PIN: ")?);
    if pin.is_empty() {
        bail!("No PIN provided");
    }
    Ok(pin)
}

/// Reads a PIN that is about to protect a secret, asking twice.
///
/// `env` short-circuits the confirmation. Piped input supplies the PIN
/// and its confirmation on two consecutive lines.
pub fn read_new_pin(env: &str) -> Result<Zeroizing<String>> {
    if let Some(pin) = pin_from_env(env) {
        return Ok(pin);
    }

    let stdin = io::stdin();
    let (pin, confirmation) = if stdin.is_terminal() {
        (
            Zeroizing::new(rpassword::prompt_password("New PIN: ")?),
            Zeroizing::new(rpassword::prompt_password("Confirm PIN: ")?),
        )
    } else {
        let mut handle = stdin.lock();
        (read_line(&mut handle)?, read_line(&mut handle)?)
    };

    if pin.is_empty() {
        bail!("PIN cannot be empty");
    }
    if pin != confirmation {
        bail!("PINs do not match");
    }
    Ok(pin)
}

/// Reads the secret to encrypt without it touching argv.
///
/// Piped input supplies it on the first line, ahead of any PIN lines.
pub fn read_secret() -> Result<Zeroizing<String>> {
    let stdin = io::stdin();
    let secret = if stdin.is_terminal() {
        Zeroizing::new(rpassword::prompt_password("Secret: ")?)
    } else {
        read_line(&mut stdin.lock())?
    };

    if secret.is_empty() {
        bail!("No secret provided");
    }
    Ok(secret)
}

fn pin_from_env(name: &str) -> Option<Zeroizing<String>> {
    std::env::var(name)
        .ok()
        .filter(|pin| !pin.is_empty())
        .map(Zeroizing::new)
}

fn read_line(reader: &mut impl BufRead) -> Result<Zeroizing<String>> {
    let mut line = Zeroizing::new(String::new());
    reader.read_line(&mut line)?;
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(line)
}
