//! Naming rules shared by the portfolio mirror: folder names become slugs and
//! display names, file names carry their ordering in a leading number.

/// Turn a folder name into the slug used as the category key.
///
/// Characters outside `[a-z0-9]`, whitespace and `-` are dropped, whitespace
/// runs become a single `-`, dash runs collapse and the result never starts or
/// ends with `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else if ch == '-' || ch.is_whitespace() {
            pending_dash = true;
        }
    }

    slug
}

/// `family-portraits` -> `Family Portraits`, `ngo_work` -> `Ngo Work`.
pub fn display_name(folder_name: &str) -> String {
    folder_name
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// First run of ASCII digits in `name`, if it fits an `i32`.
pub fn leading_number(name: &str) -> Option<i32> {
    let start = name.find(|c: char| c.is_ascii_digit())?;
    let digits: String = name[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

pub fn looks_like_image_file(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_normalizes_folder_names() {
        assert_eq!(slugify("Family Portraits"), "family-portraits");
        assert_eq!(slugify("NGO  Storytelling!"), "ngo-storytelling");
        assert_eq!(slugify("--weddings--2024--"), "weddings-2024");
        assert_eq!(slugify("brand_work"), "brandwork");
        assert_eq!(slugify("Café"), "caf");
    }

    #[test]
    fn display_name_capitalizes_words() {
        assert_eq!(display_name("family-portraits"), "Family Portraits");
        assert_eq!(display_name("ngo_story  telling"), "Ngo Story Telling");
        assert_eq!(display_name("lifestyle"), "Lifestyle");
    }

    #[test]
    fn leading_number_takes_first_digit_run() {
        assert_eq!(leading_number("IMG_0042_edit3.jpg"), Some(42));
        assert_eq!(leading_number("cover.jpg"), None);
        assert_eq!(leading_number("99999999999.jpg"), None);
    }

    #[test]
    fn extension_helpers() {
        assert_eq!(strip_extension("photo.final.jpg"), "photo.final");
        assert_eq!(strip_extension(".hidden"), ".hidden");
        assert!(looks_like_image_file("A.JPEG"));
        assert!(!looks_like_image_file("beach-day"));
    }

    #[test]
    fn escape_html_handles_markup() {
        assert_eq!(
            escape_html("<b>\"Tom\" & 'Jerry'</b>"),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }
}
