use clap::ValueEnum;

/// Coarse bucket every request rolls up into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Sparql,
    OcApi,
    Dataset,
    AdditionalServices,
    Others,
}

impl Category {
    pub const COUNT: usize = 5;

    pub const ALL: [Category; Category::COUNT] = [
        Category::Sparql,
        Category::OcApi,
        Category::Dataset,
        Category::AdditionalServices,
        Category::Others,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Sparql => "sparql",
            Category::OcApi => "oc_api",
            Category::Dataset => "dataset",
            Category::AdditionalServices => "additional_services",
            Category::Others => "others",
        }
    }

    /// Label used for the aggregate counter, e.g. `sparql_requests`.
    pub fn counter_key(self) -> &'static str {
        match self {
            Category::Sparql => "sparql_requests",
            Category::OcApi => "oc_api_requests",
            Category::Dataset => "dataset_requests",
            Category::AdditionalServices => "additional_services_requests",
            Category::Others => "others_requests",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// A single classification rule. The matcher doubles as the endpoint label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRule {
    Suffix {
        matcher: &'static str,
        category: Category,
    },
    Substring {
        matcher: &'static str,
        category: Category,
    },
}

impl EndpointRule {
    pub fn label(&self) -> &'static str {
        match self {
            EndpointRule::Suffix { matcher, .. } | EndpointRule::Substring { matcher, .. } => {
                *matcher
            }
        }
    }

    pub fn category(&self) -> Category {
        match self {
            EndpointRule::Suffix { category, .. } | EndpointRule::Substring { category, .. } => {
                *category
            }
        }
    }
}

const fn suffix(matcher: &'static str, category: Category) -> EndpointRule {
    EndpointRule::Suffix { matcher, category }
}

const fn substring(matcher: &'static str, category: Category) -> EndpointRule {
    EndpointRule::Substring { matcher, category }
}

// Declaration order is precedence. `/api/v1/` must stay below the more
// specific API paths, and `/index/` shadows the `/index/.../ci/` entries.
const FULL_RULES: &[EndpointRule] = &[
    suffix("/sparql", Category::Sparql),
    suffix("/index/sparql", Category::Sparql),
    suffix("/meta/sparql", Category::Sparql),
    suffix("/ccc/sparql", Category::Sparql),
    substring("/index/api/v1/", Category::OcApi),
    substring("/index/api/v2/", Category::OcApi),
    substring("/index/coci/api/v1/", Category::OcApi),
    substring("/index/croci/api/v1/", Category::OcApi),
    substring("/meta/api/v1/", Category::OcApi),
    substring("/meta/api/v2/", Category::OcApi),
    substring("/ccc/api/v1/", Category::OcApi),
    substring("/api/v1/", Category::OcApi),
    substring("/api/v2/", Category::OcApi),
    substring("/corpus/", Category::Dataset),
    substring("/index/", Category::Dataset),
    substring("/index/ci/", Category::Dataset),
    substring("/index/coci/ci/", Category::Dataset),
    substring("/index/croci/ci/", Category::Dataset),
    substring("/ccc/", Category::Dataset),
    substring("/meta/", Category::Dataset),
    substring("/oci", Category::AdditionalServices),
    substring("/intrepid", Category::AdditionalServices),
];

/// Reconstructed subset of `FULL_RULES` for logs predating the Meta and CCC
/// services. No historical rule list survives, so this is not a record of
/// what the earlier extractor actually used.
const LEGACY_RULES: &[EndpointRule] = &[
    suffix("/sparql", Category::Sparql),
    suffix("/index/sparql", Category::Sparql),
    substring("/index/api/v1/", Category::OcApi),
    substring("/index/coci/api/v1/", Category::OcApi),
    substring("/index/croci/api/v1/", Category::OcApi),
    substring("/api/v1/", Category::OcApi),
    substring("/corpus/", Category::Dataset),
    substring("/index/coci/ci/", Category::Dataset),
    substring("/index/croci/ci/", Category::Dataset),
    substring("/oci", Category::AdditionalServices),
    substring("/intrepid", Category::AdditionalServices),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaxonomyGeneration {
    /// Current endpoint list, including Meta and CCC services
    Full,
    /// Earlier, smaller endpoint list
    Legacy,
}

/// An ordered rule list. Suffix rules are always tried before substring
/// rules; within each group the first declared match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Taxonomy {
    rules: &'static [EndpointRule],
}

impl Taxonomy {
    pub fn full() -> Self {
        Taxonomy { rules: FULL_RULES }
    }

    pub fn legacy() -> Self {
        Taxonomy {
            rules: LEGACY_RULES,
        }
    }

    pub fn from_rules(rules: &'static [EndpointRule]) -> Self {
        Taxonomy { rules }
    }

    pub fn rules(&self) -> &'static [EndpointRule] {
        self.rules
    }

    pub fn labels(&self) -> impl Iterator<Item = &'static str> {
        let rules: &'static [EndpointRule] = self.rules;
        rules.iter().map(|rule| rule.label())
    }
}

impl From<TaxonomyGeneration> for Taxonomy {
    fn from(generation: TaxonomyGeneration) -> Self {
        match generation {
            TaxonomyGeneration::Full => Taxonomy::full(),
            TaxonomyGeneration::Legacy => Taxonomy::legacy(),
        }
    }
}

/// How suffix rules are compared against the request URI.
///
/// The production extractor tests suffix rules with `starts_with`, which is
/// what lets `/sparql?query=...` count as a SPARQL request. `Suffix` applies
/// the literal `ends_with` reading of the rule name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SuffixMatchMode {
    #[default]
    Prefix,
    Suffix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub endpoint: Option<&'static str>,
    pub category: Category,
}

#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    taxonomy: Taxonomy,
    mode: SuffixMatchMode,
}

impl Classifier {
    pub fn new(taxonomy: Taxonomy, mode: SuffixMatchMode) -> Self {
        Classifier { taxonomy, mode }
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn classify(&self, request_uri: &str) -> Classification {
        let suffix_hit = self.taxonomy.rules.iter().find(|rule| match rule {
            EndpointRule::Suffix { matcher, .. } => match self.mode {
                SuffixMatchMode::Prefix => request_uri.starts_with(*matcher),
                SuffixMatchMode::Suffix => request_uri.ends_with(*matcher),
            },
            EndpointRule::Substring { .. } => false,
        });

        let hit = suffix_hit.or_else(|| {
            self.taxonomy.rules.iter().find(|rule| match rule {
                EndpointRule::Substring { matcher, .. } => request_uri.contains(*matcher),
                EndpointRule::Suffix { .. } => false,
            })
        });

        match hit {
            Some(rule) => Classification {
                endpoint: Some(rule.label()),
                category: rule.category(),
            },
            None => Classification {
                endpoint: None,
                category: Category::Others,
            },
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::new(Taxonomy::full(), SuffixMatchMode::default())
    }
}
