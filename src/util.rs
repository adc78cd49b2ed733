use eframe::egui::Color32;

pub fn initials(label: &str) -> String {
    let mut letters = label
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .map(|c| c.to_ascii_uppercase());

    let first = letters.next().unwrap_or('?');
    match letters.next() {
        Some(second) => format!("{first}{second}"),
        None => first.to_string(),
    }
}

pub fn parse_hex_color(value: &str) -> Option<Color32> {
    let digits = value.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
    let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
    let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
    Some(Color32::from_rgb(r, g, b))
}

pub fn slug(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if (c == ' ' || c == '-' || c == '_') && !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initials_take_first_two_words() {
        assert_eq!(initials("Ada Lovelace"), "AL");
        assert_eq!(initials("plato"), "P");
        assert_eq!(initials(""), "?");
    }

    #[test]
    fn hex_colors_parse_or_reject() {
        assert_eq!(
            parse_hex_color("#336699"),
            Some(Color32::from_rgb(0x33, 0x66, 0x99))
        );
        assert_eq!(parse_hex_color("336699"), None);
        assert_eq!(parse_hex_color("#33669"), None);
        assert_eq!(parse_hex_color("#3366zz"), None);
    }

    #[test]
    fn slugs_collapse_separators() {
        assert_eq!(slug("Ada  Lovelace"), "ada-lovelace");
        assert_eq!(slug("  weird -- name  "), "weird-name");
    }
}
