//! The resolution phase: tile address to fetchable image URL.

use super::config::{append_query, OverlayConfig};
use super::tiling::TileAddress;

/// Resolves the image URL for one tile address.
///
/// Pure function of the configuration: the key-value-pair dialect is used
/// unless a URL template is configured. Levels outside the configured range
/// are not clamped here; staying in range is the caller's responsibility.
pub fn resolve_tile_url(config: &OverlayConfig, address: TileAddress) -> String {
    let url = match &config.url_template {
        Some(template) => expand_template(template, config, address),
        None => build_kvp_url(config, address),
    };
    substitute_subdomain(url, config, address)
}

/// The label services use for a level: the configured label list when one
/// is present and in range, otherwise the numeric level.
fn tile_matrix_label(config: &OverlayConfig, level: u32) -> String {
    config
        .tile_matrix_labels
        .as_ref()
        .and_then(|labels| labels.get(level as usize))
        .cloned()
        .unwrap_or_else(|| level.to_string())
}

/// Key-value-pair dialect: fixed protocol parameters followed by the tile
/// addressing parameters, appended as query parameters.
fn build_kvp_url(config: &OverlayConfig, address: TileAddress) -> String {
    let mut url = config.base_url.clone();
    append_query(&mut url, "SERVICE", "WMTS");
    append_query(&mut url, "VERSION", "1.0.0");
    append_query(&mut url, "REQUEST", "GetTile");
    append_query(&mut url, "tilematrix", &tile_matrix_label(config, address.level));
    append_query(&mut url, "layer", &config.layer);
    append_query(&mut url, "style", &config.style);
    append_query(
        &mut url,
        "tilerow",
        &config.tiling.inverted_row(address).to_string(),
    );
    append_query(&mut url, "tilecol", &address.x.to_string());
    append_query(&mut url, "tilematrixset", &config.tile_matrix_set);
    append_query(&mut url, "format", &config.format);
    if let Some(token) = &config.token {
        append_query(&mut url, &token.key, &token.value);
    }
    url
}

/// Template dialect: named placeholder substitution. Placeholders with no
/// corresponding value stay as literal `{name}` text.
fn expand_template(template: &str, config: &OverlayConfig, address: TileAddress) -> String {
    let mut url = template.to_string();
    let substitutions = [
        ("{Style}", config.style.clone()),
        ("{TileMatrixSet}", config.tile_matrix_set.clone()),
        ("{TileMatrix}", tile_matrix_label(config, address.level)),
        ("{TileRow}", config.tiling.inverted_row(address).to_string()),
        ("{TileCol}", address.x.to_string()),
        ("{Layer}", config.layer.clone()),
    ];
    for (placeholder, value) in substitutions {
        url = url.replace(placeholder, &value);
    }
    if let Some(token) = &config.token {
        url = url.replace(&format!("{{{}}}", token.key), &token.value);
    }
    url
}

/// Replaces a `{subdomain}` or `{s}` placeholder by rotating through the
/// configured subdomains, keyed on the tile address so neighboring tiles
/// spread across hosts.
fn substitute_subdomain(url: String, config: &OverlayConfig, address: TileAddress) -> String {
    if config.subdomains.is_empty() {
        return url;
    }
    let index = (address.level as usize + address.x as usize + address.y as usize)
        % config.subdomains.len();
    let subdomain = &config.subdomains[index];
    url.replace("{subdomain}", subdomain).replace("{s}", subdomain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::config::{OverlayOptions, OverlayParams};
    use crate::overlay::AuthToken;

    fn config(options: OverlayOptions) -> OverlayConfig {
        OverlayConfig::from_options(
            OverlayParams {
                base_url: "https://{s}.tiles.example.com/wmts".to_string(),
                layer: "imagery".to_string(),
                style: "default".to_string(),
                tile_matrix_set: "g".to_string(),
                format: "image/jpeg".to_string(),
            },
            options,
        )
    }

    #[test]
    fn test_kvp_url_parameters() {
        let url = resolve_tile_url(
            &config(OverlayOptions::default()),
            TileAddress { level: 3, x: 2, y: 5 },
        );
        // Mercator has 8 rows at level 3, so y=5 inverts to row 2.
        assert_eq!(
            url,
            "https://b.tiles.example.com/wmts?SERVICE=WMTS&VERSION=1.0.0&REQUEST=GetTile\
             &tilematrix=3&layer=imagery&style=default&tilerow=2&tilecol=2\
             &tilematrixset=g&format=image/jpeg"
        );
    }

    #[test]
    fn test_subdomain_rotation() {
        // (level + x + y) mod 3: 10 mod 3 = 1 -> "b".
        let url = resolve_tile_url(
            &config(OverlayOptions::default()),
            TileAddress { level: 3, x: 2, y: 5 },
        );
        assert!(url.starts_with("https://b."), "{}", url);
        // One tile east rotates to the next subdomain.
        let next = resolve_tile_url(
            &config(OverlayOptions::default()),
            TileAddress { level: 3, x: 3, y: 5 },
        );
        assert!(next.starts_with("https://c."), "{}", next);
    }

    #[test]
    fn test_kvp_token_appended() {
        let options = OverlayOptions {
            token: Some(AuthToken {
                key: "tk".to_string(),
                value: "secret".to_string(),
            }),
            ..Default::default()
        };
        let url = resolve_tile_url(&config(options), TileAddress { level: 1, x: 0, y: 0 });
        assert!(url.ends_with("&tk=secret"), "{}", url);
    }

    #[test]
    fn test_template_substitution_inverts_row() {
        let options = OverlayOptions {
            url_template: Some(
                "https://{s}.example.com/{Layer}/{Style}/{TileMatrixSet}/{TileMatrix}/{TileRow}/{TileCol}.jpg"
                    .to_string(),
            ),
            ..Default::default()
        };
        let url = resolve_tile_url(&config(options), TileAddress { level: 3, x: 2, y: 5 });
        // Row must be the inverted row (2), not the raw y (5).
        assert_eq!(url, "https://b.example.com/imagery/default/g/3/2/2.jpg");
    }

    #[test]
    fn test_template_unresolved_placeholder_left_literal() {
        let options = OverlayOptions {
            url_template: Some("https://example.com/{TileMatrix}/{Unknown}.jpg".to_string()),
            ..Default::default()
        };
        let url = resolve_tile_url(&config(options), TileAddress { level: 2, x: 1, y: 1 });
        assert_eq!(url, "https://example.com/2/{Unknown}.jpg");
    }

    #[test]
    fn test_template_token_substitution() {
        let options = OverlayOptions {
            url_template: Some("https://example.com/{TileMatrix}?key={apikey}".to_string()),
            token: Some(AuthToken {
                key: "apikey".to_string(),
                value: "secret".to_string(),
            }),
            ..Default::default()
        };
        let url = resolve_tile_url(&config(options), TileAddress { level: 0, x: 0, y: 0 });
        assert_eq!(url, "https://example.com/0?key=secret");
    }

    #[test]
    fn test_label_list_lookup_with_fallback() {
        let options = OverlayOptions {
            tile_matrix_labels: Some(vec!["L0".to_string(), "L1".to_string()]),
            ..Default::default()
        };
        let cfg = config(options);
        let labeled = resolve_tile_url(&cfg, TileAddress { level: 1, x: 0, y: 0 });
        assert!(labeled.contains("tilematrix=L1"), "{}", labeled);
        // Out of range of the label list: numeric level.
        let numeric = resolve_tile_url(&cfg, TileAddress { level: 5, x: 0, y: 0 });
        assert!(numeric.contains("tilematrix=5"), "{}", numeric);
    }

    #[test]
    fn test_subdomain_sum_divisible_by_count_selects_first() {
        let url = resolve_tile_url(
            &config(OverlayOptions::default()),
            TileAddress { level: 3, x: 2, y: 1 },
        );
        assert!(url.starts_with("https://a."), "{}", url);
    }
}
