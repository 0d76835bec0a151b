//! Outbound links for the dialer and the maps app.

const MAP_SEARCH_BASE: &str = "https://www.google.com/maps/search/?api=1&query=";
const MAP_REGION_SUFFIX: &str = "Chinhoyi, Zimbabwe";

/// `tel:` URL with the number as displayed.
pub fn tel_url(phone: &str) -> String {
    format!("tel:{}", phone.trim())
}

/// Map search URL for a free-form query.
pub fn map_search_url(query: &str) -> String {
    format!("{MAP_SEARCH_BASE}{}", urlencoding::encode(query))
}

/// Map search for a named place at `address`.
pub fn place_map_url(name: &str, address: &str) -> String {
    map_search_url(&format!("{name}, {address}, {MAP_REGION_SUFFIX}"))
}

/// Map search for a bare address.
pub fn address_map_url(address: &str) -> String {
    map_search_url(&format!("{address}, {MAP_REGION_SUFFIX}"))
}

#[cfg(test)]
mod tests {
    use super::{address_map_url, place_map_url, tel_url};

    #[test]
    fn tel_url_keeps_number_formatting() {
        assert_eq!(tel_url(" +263 67 2122461 "), "tel:+263 67 2122461");
    }

    #[test]
    fn map_urls_are_percent_encoded() {
        assert_eq!(
            address_map_url("Magamba Way"),
            "https://www.google.com/maps/search/?api=1&query=Magamba%20Way%2C%20Chinhoyi%2C%20Zimbabwe"
        );
        assert!(place_map_url("Mzimba Pharmacy", "Magamba Way, Chinhoyi")
            .starts_with("https://www.google.com/maps/search/?api=1&query=Mzimba%20Pharmacy%2C"));
    }
}
