//! Color generation and shading.
//!
//! Base colors are random per run, drawn from an injectable `ColorSource` so
//! tests can seed them. Shades scale HSL lightness while keeping hue and
//! saturation, so a (source, destination) pair stays visually one family.

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::enrich::types::{ColorMode, Rgb};
use crate::error_handling::types::EnrichError;
use crate::reader::types::ConnectionRecord;

/// HSL triple; all components in `[0, 1]` (hue as a turn fraction).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Rgb {
    pub fn to_hsl(self) -> Hsl {
        let r = self.r as f64 / 255.0;
        let g = self.g as f64 / 255.0;
        let b = self.b as f64 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;

        if max == min {
            return Hsl { h: 0.0, s: 0.0, l };
        }

        let d = max - min;
        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };
        let h = if max == r {
            ((g - b) / d).rem_euclid(6.0)
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        } / 6.0;

        Hsl { h, s, l }
    }

    pub fn from_hsl(hsl: Hsl) -> Rgb {
        let Hsl { h, s, l } = hsl;
        if s == 0.0 {
            let v = (l * 255.0).round() as u8;
            return Rgb::new(v, v, v);
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let channel = |t: f64| -> u8 {
            let t = t.rem_euclid(1.0);
            let v = if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 1.0 / 2.0 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            };
            (v * 255.0).round() as u8
        };

        Rgb::new(
            channel(h + 1.0 / 3.0),
            channel(h),
            channel(h - 1.0 / 3.0),
        )
    }

    /// Scale lightness by `factor` (clamped to `[0, 1]`), preserving hue and
    /// saturation.
    pub fn shade(self, factor: f64) -> Rgb {
        let mut hsl = self.to_hsl();
        hsl.l = (hsl.l * factor).clamp(0.0, 1.0);
        Rgb::from_hsl(hsl)
    }

    /// Whether label text on this color needs a light foreground.
    pub fn is_dark(self) -> bool {
        self.to_hsl().l < 0.5
    }
}

/// Lightness factor for the n-th distinct port of a pair: 1.0, 0.8, 0.6, …
/// clamped at zero.
pub fn shade_factor(port_index: usize) -> f64 {
    (1.0 - 0.2 * port_index as f64).clamp(0.0, 1.0)
}

/// Supplier of base colors.
pub trait ColorSource {
    fn next_color(&mut self) -> Rgb;
}

/// Random colors, optionally seeded for reproducible output.
pub struct RandomColors {
    rng: StdRng,
}

impl RandomColors {
    pub fn new() -> Self {
        RandomColors {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        RandomColors {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomColors {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorSource for RandomColors {
    fn next_color(&mut self) -> Rgb {
        Rgb::new(self.rng.random(), self.rng.random(), self.rng.random())
    }
}

/// Assign one display color per record, in batch order.
///
/// Per-source mode hands each distinct source address one color. Per-pair
/// mode hands each (source, destination) pair one base color and shades it
/// per destination port, port order fixed by first observation in the batch.
pub fn assign_colors(
    records: &[&ConnectionRecord],
    mode: ColorMode,
    colors: &mut dyn ColorSource,
) -> Result<Vec<Rgb>, EnrichError> {
    match mode {
        ColorMode::PerSource => {
            let mut by_source: IndexMap<&str, Rgb> = IndexMap::new();
            Ok(records
                .iter()
                .map(|record| {
                    *by_source
                        .entry(record.id_orig_h.as_str())
                        .or_insert_with(|| colors.next_color())
                })
                .collect())
        }
        ColorMode::PerPair => {
            let mut bases: IndexMap<(&str, &str), Rgb> = IndexMap::new();
            let mut ports: IndexMap<(&str, &str), Vec<&str>> = IndexMap::new();
            let mut shades: IndexMap<(&str, &str, &str), Rgb> = IndexMap::new();

            for record in records {
                let pair = (record.id_orig_h.as_str(), record.id_resp_h.as_str());
                let base = *bases.entry(pair).or_insert_with(|| colors.next_color());

                let seen = ports.entry(pair).or_default();
                let port = record.id_resp_p.as_str();
                let index = match seen.iter().position(|p| *p == port) {
                    Some(index) => index,
                    None => {
                        seen.push(port);
                        seen.len() - 1
                    }
                };
                shades
                    .entry((pair.0, pair.1, port))
                    .or_insert_with(|| base.shade(shade_factor(index)));
            }

            records
                .iter()
                .map(|record| {
                    let key = (
                        record.id_orig_h.as_str(),
                        record.id_resp_h.as_str(),
                        record.id_resp_p.as_str(),
                    );
                    shades.get(&key).copied().ok_or_else(|| {
                        EnrichError::InternalInconsistency(format!(
                            "no shade assigned for {}->{}:{}",
                            key.0, key.1, key.2
                        ))
                    })
                })
                .collect()
        }
    }
}
