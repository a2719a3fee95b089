use crate::tiles::quad_key::QuadKey;

/// Trait representing anything that can produce tile URLs for a quad key.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `quad`.
    fn url(&self, quad: &QuadKey) -> String;
}

/// URL template source.
///
/// Placeholders: `{q}` quad key, `{z}` zoom, `{x}` column, `{y}` row
/// (counted from the north) and `{s}` a subdomain picked from the tile
/// position so neighbouring tiles spread across hosts.
#[derive(Debug, Clone)]
pub struct QuadKeyUrlSource {
    template: String,
    subdomains: Vec<String>,
}

impl QuadKeyUrlSource {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            subdomains: Vec::new(),
        }
    }

    pub fn with_subdomains<I, S>(mut self, subdomains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subdomains = subdomains.into_iter().map(Into::into).collect();
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

impl TileSource for QuadKeyUrlSource {
    fn url(&self, quad: &QuadKey) -> String {
        let (x, y) = quad.tile_xy();
        let mut url = self
            .template
            .replace("{q}", quad.as_str())
            .replace("{z}", &quad.zoom().to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string());

        if !self.subdomains.is_empty() {
            let idx = ((u64::from(x) + u64::from(y)) % self.subdomains.len() as u64) as usize;
            url = url.replace("{s}", &self.subdomains[idx]);
        }
        url
    }
}
