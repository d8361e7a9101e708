//! Statische tabellen: componenttype → NeXus-klasse en NeXus-veld →
//! componentparameter.

use wildmatch::WildMatch;

/// Klasse voor types zonder enige match.
pub const FALLBACK_CLASS: &str = "NXnote";

/// Componenttypes met een vaste NeXus-klasse.
const TYPE_CLASSES: &[(&str, &str)] = &[
    ("DiskChopper", "NXdisk_chopper"),
    ("FermiChopper", "NXfermi_chopper"),
    ("FermiChopper_ILL", "NXfermi_chopper"),
    ("Fermi_chop2a", "NXfermi_chopper"),
    ("Filter_gen", "NXfilter"),
    ("Filter_graphite", "NXfilter"),
    ("Elliptic_guide_gravity", "NXguide"),
    ("Mirror", "NXmirror"),
    ("Monochromator_flat", "NXmonochromator"),
    ("Monochromator_curved", "NXmonochromator"),
    ("Monochromator_pol", "NXpolarizer"),
    ("Pol_bender", "NXpolarizer"),
    ("Pol_mirror", "NXpolarizer"),
    ("Pol_SF_ideal", "NXflipper"),
    ("Selector", "NXvelocity_selector"),
    ("V_selector", "NXvelocity_selector"),
    ("SNS_source", "NXmoderator"),
    ("SNS_source_analytic", "NXmoderator"),
    ("Source_pulsed", "NXmoderator"),
    ("ViewModISIS", "NXmoderator"),
    ("Slit", "NXslit"),
    ("Collimator_linear", "NXcollimator"),
];

/// Componentcategorieën met een vaste NeXus-klasse.
const CATEGORY_CLASSES: &[(&str, &str)] = &[
    ("sources", "NXmoderator"),
    ("monitors", "NXdetector"),
    ("samples", "NXsample"),
];

/// Families van types, herkend op naamprefix.
const FAMILY_CLASSES: &[(&str, &str)] = &[("Guide*", "NXguide"), ("Collimator*", "NXcollimator")];

/// Per NeXus-klasse: doelveld → bronparameter. Posities staan alleen in
/// `transformations`; een `distance`-veld wordt niet afgeleid.
const CLASS_FIELDS: &[(&str, &[(&str, &str)])] = &[
    ("NXaperture", &[("x_gap", "xwidth"), ("y_gap", "yheight")]),
    ("NXslit", &[("x_gap", "xwidth"), ("y_gap", "yheight")]),
    (
        "NXcollimator",
        &[("divergence_x", "divergence"), ("divergence_y", "divergenceV")],
    ),
    ("NXdetector", &[]),
    (
        "NXdisk_chopper",
        &[
            ("slits", "nslit"),
            ("rotation_speed", "nu"),
            ("radius", "radius"),
            ("slit_angle", "theta_0"),
            ("slit_height", "yheight"),
            ("phase", "phase"),
        ],
    ),
    (
        "NXfermi_chopper",
        &[
            ("rotation_speed", "nu"),
            ("radius", "radius"),
            ("slit", "w"),
            ("r_slit", "curvature"),
            ("number", "nslit"),
            ("width", "xwidth"),
            ("height", "yheight"),
        ],
    ),
    ("NXguide", &[("m_value", "m")]),
    ("NXsample", &[]),
    ("NXmoderator", &[]),
];

/// Zoekt de NeXus-klasse: eerst op type, dan op categorie, dan op familie.
/// Hoofdletters en omringende spaties tellen niet mee, net als in het register.
#[must_use]
pub fn class_for(type_name: &str, category: Option<&str>) -> &'static str {
    let type_name = type_name.trim();
    if let Some((_, class)) = TYPE_CLASSES.iter().find(|(name, _)| name.eq_ignore_ascii_case(type_name)) {
        return *class;
    }
    if let Some(category) = category.map(str::trim) {
        if let Some((_, class)) = CATEGORY_CLASSES.iter().find(|(name, _)| name.eq_ignore_ascii_case(category)) {
            return *class;
        }
    }
    let lowered = type_name.to_lowercase();
    FAMILY_CLASSES
        .iter()
        .find(|(pattern, _)| WildMatch::new(&pattern.to_lowercase()).matches(&lowered))
        .map_or(FALLBACK_CLASS, |(_, class)| *class)
}

/// Doelveld → bronparameter voor een klasse; leeg voor onbekende klassen.
#[must_use]
pub fn fields_for(class: &str) -> &'static [(&'static str, &'static str)] {
    match CLASS_FIELDS.iter().find(|(name, _)| *name == class) {
        Some((_, fields)) => *fields,
        None => &[],
    }
}
