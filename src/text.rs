//! Normalización de texto y extracción de n-gramas de palabras.

/// Pasa a minúsculas, colapsa los espacios y recorta los extremos.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tokens alfanuméricos de al menos dos caracteres.
/// Espera texto ya normalizado.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .collect()
}

/// N-gramas de palabras para `n` en `1..=max_n`, unidos por un espacio.
pub fn ngrams(text: &str, max_n: usize) -> Vec<String> {
    let tokens = tokenize(text);
    let max_n = max_n.max(1);
    let mut out = Vec::with_capacity(tokens.len() * max_n);

    for n in 1..=max_n {
        if n > tokens.len() {
            break;
        }
        for window in tokens.windows(n) {
            out.push(window.join(" "));
        }
    }

    out
}
