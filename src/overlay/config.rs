//! Overlay configuration: explicit options, discovered values, resolution.

use super::capabilities::{
    parse_capabilities, CapabilitiesError, DiscoveredCapabilities, FALLBACK_MAXIMUM_LEVEL,
    FALLBACK_MINIMUM_LEVEL,
};
use super::projection::{GlobeRectangle, Projection, Rectangle};
use super::tiling::TilingScheme;
use crate::pipeline::{Future, TaskSystem};
use tracing::debug;

/// Subdomains used when neither the options nor the service supply any.
pub const DEFAULT_SUBDOMAINS: [&str; 3] = ["a", "b", "c"];

/// Tile pixel size used when unspecified.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// An authentication token appended to resolved URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub key: String,
    pub value: String,
}

/// Identity of the overlay being configured: which service, layer and
/// format tile URLs should name.
#[derive(Debug, Clone)]
pub struct OverlayParams {
    pub base_url: String,
    pub layer: String,
    pub style: String,
    pub tile_matrix_set: String,
    pub format: String,
}

/// Explicit configuration overrides. Every populated field beats the
/// corresponding discovered value.
#[derive(Debug, Clone, Default)]
pub struct OverlayOptions {
    /// URL template; when absent the key-value-pair dialect is used.
    pub url_template: Option<String>,
    pub coverage: Option<GlobeRectangle>,
    pub minimum_level: Option<u32>,
    pub maximum_level: Option<u32>,
    pub tile_size: Option<u32>,
    pub subdomains: Option<Vec<String>>,
    pub tile_matrix_labels: Option<Vec<String>>,
    pub token: Option<AuthToken>,
}

/// Fully resolved overlay configuration. Immutable once built; the
/// resolution phase is a pure function of this value and a tile address.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    pub base_url: String,
    pub layer: String,
    pub style: String,
    pub tile_matrix_set: String,
    pub format: String,
    pub projection: Projection,
    pub tiling: TilingScheme,
    pub coverage: Rectangle,
    pub minimum_level: u32,
    pub maximum_level: u32,
    pub tile_size: u32,
    pub subdomains: Vec<String>,
    pub tile_matrix_labels: Option<Vec<String>>,
    pub url_template: Option<String>,
    pub token: Option<AuthToken>,
}

impl OverlayConfig {
    /// URL of the service's capability document: the base URL with the
    /// fixed protocol parameters and the describe operation appended.
    pub fn capabilities_url(base_url: &str) -> String {
        let mut url = base_url.to_string();
        append_query(&mut url, "SERVICE", "WMTS");
        append_query(&mut url, "VERSION", "1.0.0");
        append_query(&mut url, "REQUEST", "GetCapabilities");
        url
    }

    /// Combines discovered capabilities with explicit overrides into a
    /// resolved configuration. Overrides always win.
    pub fn from_capabilities(
        params: OverlayParams,
        discovered: &DiscoveredCapabilities,
        options: OverlayOptions,
    ) -> Self {
        let projection = discovered.projection;
        let tiling = TilingScheme::for_projection(projection);

        let coverage = options
            .coverage
            .or(discovered.coverage)
            .map(|globe| projection.project(globe))
            .unwrap_or(tiling.rectangle);

        let mut minimum_level = options.minimum_level.unwrap_or(discovered.minimum_level);
        let maximum_level = options.maximum_level.unwrap_or(discovered.maximum_level);
        minimum_level = minimum_level.min(maximum_level);

        let subdomains = match options.subdomains {
            Some(list) if !list.is_empty() => list,
            _ => DEFAULT_SUBDOMAINS.iter().map(|s| s.to_string()).collect(),
        };

        let tile_matrix_labels = options.tile_matrix_labels.or_else(|| {
            if discovered.tile_matrix_labels.is_empty() {
                None
            } else {
                Some(discovered.tile_matrix_labels.clone())
            }
        });

        debug!(
            layer = %params.layer,
            ?projection,
            minimum_level,
            maximum_level,
            "resolved overlay configuration"
        );

        Self {
            base_url: params.base_url,
            layer: params.layer,
            style: params.style,
            tile_matrix_set: params.tile_matrix_set,
            format: params.format,
            projection,
            tiling,
            coverage,
            minimum_level,
            maximum_level,
            tile_size: options.tile_size.unwrap_or(DEFAULT_TILE_SIZE),
            subdomains,
            tile_matrix_labels,
            url_template: options.url_template,
            token: options.token,
        }
    }

    /// Builds a configuration from explicit options alone, for services
    /// without a capability document. Unspecified fields use the Mercator
    /// defaults.
    pub fn from_options(params: OverlayParams, options: OverlayOptions) -> Self {
        let fallback = DiscoveredCapabilities {
            projection: Projection::WebMercator,
            tile_matrix_labels: Vec::new(),
            minimum_level: FALLBACK_MINIMUM_LEVEL,
            maximum_level: FALLBACK_MAXIMUM_LEVEL,
            coverage: None,
        };
        Self::from_capabilities(params, &fallback, options)
    }
}

/// Appends one query parameter, starting the query string if needed.
pub(super) fn append_query(url: &mut String, key: &str, value: &str) {
    url.push(if url.contains('?') { '&' } else { '?' });
    url.push_str(key);
    url.push('=');
    url.push_str(value);
}

/// Discovery phase over the task system: parses a fetched capability
/// document on a worker and finalizes the configuration on the
/// orchestration thread.
pub fn configure(
    system: &TaskSystem,
    document: String,
    params: OverlayParams,
    options: OverlayOptions,
) -> Future<Result<OverlayConfig, CapabilitiesError>> {
    let tile_matrix_set = params.tile_matrix_set.clone();
    system
        .run_on_worker(move || parse_capabilities(&document, &tile_matrix_set))
        .then_on_orchestrator(move |parsed| {
            parsed.map(|discovered| OverlayConfig::from_capabilities(params, &discovered, options))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> OverlayParams {
        OverlayParams {
            base_url: "https://tiles.example.com/wmts".to_string(),
            layer: "imagery".to_string(),
            style: "default".to_string(),
            tile_matrix_set: "g".to_string(),
            format: "image/jpeg".to_string(),
        }
    }

    fn discovered() -> DiscoveredCapabilities {
        DiscoveredCapabilities {
            projection: Projection::WebMercator,
            tile_matrix_labels: vec!["0".into(), "1".into(), "2".into()],
            minimum_level: 0,
            maximum_level: 2,
            coverage: None,
        }
    }

    #[test]
    fn test_capabilities_url() {
        assert_eq!(
            OverlayConfig::capabilities_url("https://tiles.example.com/wmts"),
            "https://tiles.example.com/wmts?SERVICE=WMTS&VERSION=1.0.0&REQUEST=GetCapabilities"
        );
        // An existing query string is extended, not restarted.
        assert_eq!(
            OverlayConfig::capabilities_url("https://tiles.example.com/wmts?key=k"),
            "https://tiles.example.com/wmts?key=k&SERVICE=WMTS&VERSION=1.0.0&REQUEST=GetCapabilities"
        );
    }

    #[test]
    fn test_overrides_beat_discovered_values() {
        let options = OverlayOptions {
            minimum_level: Some(3),
            maximum_level: Some(12),
            tile_size: Some(512),
            tile_matrix_labels: Some(vec!["EPSG:3857:0".into()]),
            ..Default::default()
        };
        let config = OverlayConfig::from_capabilities(params(), &discovered(), options);
        assert_eq!(config.minimum_level, 3);
        assert_eq!(config.maximum_level, 12);
        assert_eq!(config.tile_size, 512);
        assert_eq!(
            config.tile_matrix_labels,
            Some(vec!["EPSG:3857:0".to_string()])
        );
    }

    #[test]
    fn test_discovered_values_used_without_overrides() {
        let config =
            OverlayConfig::from_capabilities(params(), &discovered(), OverlayOptions::default());
        assert_eq!(config.minimum_level, 0);
        assert_eq!(config.maximum_level, 2);
        assert_eq!(config.tile_size, DEFAULT_TILE_SIZE);
        assert_eq!(config.tile_matrix_labels, Some(vec!["0".to_string(), "1".to_string(), "2".to_string()]));
    }

    #[test]
    fn test_empty_subdomains_fall_back_to_default() {
        let options = OverlayOptions {
            subdomains: Some(Vec::new()),
            ..Default::default()
        };
        let config = OverlayConfig::from_capabilities(params(), &discovered(), options);
        assert_eq!(config.subdomains, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_minimum_level_clamped_to_maximum() {
        let options = OverlayOptions {
            minimum_level: Some(9),
            maximum_level: Some(4),
            ..Default::default()
        };
        let config = OverlayConfig::from_capabilities(params(), &discovered(), options);
        assert_eq!(config.minimum_level, 4);
        assert_eq!(config.maximum_level, 4);
    }

    #[test]
    fn test_configure_over_task_system() {
        let document = r#"<Capabilities><Contents>
            <TileMatrixSet>
              <ows:Identifier>g</ows:Identifier>
              <ows:SupportedCRS>urn:ogc:def:crs:EPSG::4490</ows:SupportedCRS>
              <TileMatrix><ows:Identifier>0</ows:Identifier></TileMatrix>
              <TileMatrix><ows:Identifier>1</ows:Identifier></TileMatrix>
            </TileMatrixSet>
          </Contents></Capabilities>"#;
        let system = TaskSystem::new(2);
        let config = configure(
            &system,
            document.to_string(),
            params(),
            OverlayOptions::default(),
        )
        .wait()
        .expect("configuration should succeed");
        assert_eq!(config.projection, Projection::Geographic);
        assert_eq!(config.tiling.root_tiles_x, 2);
        assert_eq!(config.maximum_level, 1);
    }
}
