use crate::error::SummaryError;
use regex::Regex;
use std::collections::HashSet;

/// Classification rules passed in by the caller rather than hard-coded, so
/// new parameter kinds can be added without touching the engine.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Names matching this pattern are internal (latent variables, raw
    /// parameterizations, prior placeholders, log density) and dropped
    /// before classification.
    pub exclude: Regex,
    /// Vocabulary of family-specific distributional parameters.  A word
    /// matches exactly or as a `word_` prefix (response-suffixed names
    /// like `sigma_y1`).
    pub family_params: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            exclude: Regex::new(r"^(r_|s_|z_|zs_|zgp_|L_|Lrescor|Xme_|prior_|lprior|lp__)")
                .expect("default exclusion pattern should be valid"),
            family_params: [
                "sigma", "shape", "nu", "phi", "kappa", "beta", "zi", "hu", "zoi", "coi",
                "disc", "bs", "ndt", "bias", "xi", "alpha", "theta",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Semantic role of a parameter, produced by the naming-convention boundary
/// parser.  Everything downstream dispatches on this tag; the naming rules
/// live only in [`kind_of`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// Population-level (fixed-effect) coefficient, `b_*`.
    Population,
    /// Family-specific distributional parameter (`sigma`, `shape`, ...).
    Family,
    /// Residual correlation between response variables, `rescor__*`.
    ResidualCor,
    /// Autocorrelation-structure parameter (`ar`, `ma`, `car`, ...).
    Autocor,
    /// Group-level standard deviation, `sd_<group>__*`.
    GroupSd(String),
    /// Group-level correlation, `cor_<group>__*__*`.
    GroupCor(String),
    /// Group-level degrees of freedom, `df_<group>`.
    GroupDf(String),
    /// Spline smoothing standard deviation, `sds_*`.
    SmoothSd,
    /// Monotonic-effect simplex entry, `simo_*`.
    MonoSimplex,
    /// Gaussian-process marginal standard deviation, `sdgp_*`.
    GpSd,
    /// Gaussian-process length scale, `lscale_*`.
    GpLengthScale,
}

/// One classified parameter: its position in the sample array, its original
/// name, the rewritten display name, and its semantic tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub index: usize,
    pub name: String,
    pub display: String,
    pub kind: ParamKind,
}

/// Group-level rows for one grouping factor: standard deviations first,
/// then correlations, then degrees of freedom.
#[derive(Debug, Clone, Default)]
pub struct GroupPartition {
    pub group: String,
    pub sd: Vec<Classified>,
    pub cor: Vec<Classified>,
    pub df: Vec<Classified>,
}

impl GroupPartition {
    pub fn is_empty(&self) -> bool {
        self.sd.is_empty() && self.cor.is_empty() && self.df.is_empty()
    }

    fn len(&self) -> usize {
        self.sd.len() + self.cor.len() + self.df.len()
    }
}

/// Exhaustive partition of the input parameter names into semantic groups.
/// Together with `excluded`, the groups reconstruct the input exactly once
/// each.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub population: Vec<Classified>,
    pub family: Vec<Classified>,
    pub residual_cor: Vec<Classified>,
    pub autocor: Vec<Classified>,
    /// One entry per grouping factor, in the caller-supplied order.
    pub groups: Vec<GroupPartition>,
    pub smooth: Vec<Classified>,
    pub mono_simplex: Vec<Classified>,
    pub gp: Vec<Classified>,
    /// Original names dropped by the exclusion pattern.
    pub excluded: Vec<String>,
}

impl Partition {
    /// Total number of classified (non-excluded) parameters.
    pub fn classified_len(&self) -> usize {
        self.population.len()
            + self.family.len()
            + self.residual_cor.len()
            + self.autocor.len()
            + self.groups.iter().map(GroupPartition::len).sum::<usize>()
            + self.smooth.len()
            + self.mono_simplex.len()
            + self.gp.len()
    }
}

fn paren_display(label: &str, rest: &str) -> String {
    format!("{}({})", label, rest.split("__").collect::<Vec<_>>().join(","))
}

/// Maps a parameter name to its semantic kind and display rewrite, or `None`
/// when no convention matches.  Precedence follows the fixed rule order:
/// population, family, residual correlation, autocorrelation, group-level
/// (per known grouping factor), smooths, simplexes, GP hyperparameters.
fn kind_of(
    name: &str,
    group_labels: &[String],
    family: &Regex,
    autocor: &Regex,
) -> Option<(ParamKind, String)> {
    if let Some(rest) = name.strip_prefix("b_") {
        return Some((ParamKind::Population, rest.to_string()));
    }
    if family.is_match(name) {
        return Some((ParamKind::Family, name.to_string()));
    }
    if let Some(rest) = name.strip_prefix("rescor__") {
        return Some((ParamKind::ResidualCor, paren_display("rescor", rest)));
    }
    if autocor.is_match(name) {
        return Some((ParamKind::Autocor, name.to_string()));
    }
    for group in group_labels {
        if let Some(rest) = name.strip_prefix(&format!("sd_{}__", group)) {
            return Some((
                ParamKind::GroupSd(group.clone()),
                paren_display("sd", rest),
            ));
        }
        if let Some(rest) = name.strip_prefix(&format!("cor_{}__", group)) {
            return Some((
                ParamKind::GroupCor(group.clone()),
                paren_display("cor", rest),
            ));
        }
        if name == format!("df_{}", group) {
            return Some((ParamKind::GroupDf(group.clone()), "df".to_string()));
        }
    }
    if let Some(rest) = name.strip_prefix("sds_") {
        return Some((ParamKind::SmoothSd, format!("sds({})", rest)));
    }
    if let Some(rest) = name.strip_prefix("simo_") {
        return Some((ParamKind::MonoSimplex, rest.to_string()));
    }
    if let Some(rest) = name.strip_prefix("sdgp_") {
        return Some((ParamKind::GpSd, format!("sdgp({})", rest)));
    }
    if let Some(rest) = name.strip_prefix("lscale_") {
        return Some((ParamKind::GpLengthScale, format!("lscale({})", rest)));
    }
    None
}

/// Partitions an ordered parameter-name list into mutually exclusive
/// semantic groups using fixed naming-convention rules.
///
/// `group_labels` are the grouping-factor names known from the model
/// structure; only those labels produce group-level matches, so an unknown
/// `sd_*`/`cor_*` name is a [`SummaryError::ClassificationGap`] rather than
/// being silently dropped.  The classification is deterministic: the same
/// inputs always produce the same partition and display rewrites.
pub fn classify(
    names: &[String],
    group_labels: &[String],
    config: &ClassifierConfig,
) -> Result<Partition, SummaryError> {
    let family = Regex::new(&format!(
        "^({})(_.+)?$",
        config
            .family_params
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join("|")
    ))
    .expect("family vocabulary should form a valid pattern");
    let autocor = Regex::new(r"^(ar|ma|sderr|cosy|car|sdcar|lagsar|errorsar|rho)(\[.*\])?$")
        .expect("autocorrelation pattern should be valid");

    let mut partition = Partition {
        groups: group_labels
            .iter()
            .map(|g| GroupPartition {
                group: g.clone(),
                ..GroupPartition::default()
            })
            .collect(),
        ..Partition::default()
    };

    let mut seen: HashSet<&str> = HashSet::with_capacity(names.len());
    for (index, name) in names.iter().enumerate() {
        if !seen.insert(name.as_str()) {
            return Err(SummaryError::DuplicateParameter { name: name.clone() });
        }
        if config.exclude.is_match(name) {
            partition.excluded.push(name.clone());
            continue;
        }
        let (kind, display) = kind_of(name, group_labels, &family, &autocor)
            .ok_or_else(|| SummaryError::ClassificationGap { name: name.clone() })?;
        let entry = Classified {
            index,
            name: name.clone(),
            display,
            kind: kind.clone(),
        };
        match kind {
            ParamKind::Population => partition.population.push(entry),
            ParamKind::Family => partition.family.push(entry),
            ParamKind::ResidualCor => partition.residual_cor.push(entry),
            ParamKind::Autocor => partition.autocor.push(entry),
            ParamKind::GroupSd(ref g) | ParamKind::GroupCor(ref g) | ParamKind::GroupDf(ref g) => {
                let bucket = partition
                    .groups
                    .iter_mut()
                    .find(|p| &p.group == g)
                    .expect("group bucket exists for every known label");
                match kind {
                    ParamKind::GroupSd(_) => bucket.sd.push(entry),
                    ParamKind::GroupCor(_) => bucket.cor.push(entry),
                    _ => bucket.df.push(entry),
                }
            }
            ParamKind::SmoothSd => partition.smooth.push(entry),
            ParamKind::MonoSimplex => partition.mono_simplex.push(entry),
            ParamKind::GpSd | ParamKind::GpLengthScale => partition.gp.push(entry),
        }
    }

    debug_assert_eq!(
        partition.classified_len() + partition.excluded.len(),
        names.len()
    );
    Ok(partition)
}
