//! Schema registry: static column/criterion tables describing how a DSL key
//! maps to SQL against the Lightroom catalog schema. Flat arrays, not
//! nested maps — `lookup_column`/`lookup_criterion` do a linear scan, which
//! is fine at this table size and keeps the whole registry `const`.

pub mod errors;

pub use errors::UnknownKeyError;

/// Which catalog table a query is built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Photo,
    Collection,
}

/// One SQL rendering of a column, keyed by the value the user wrote after
/// `=` (e.g. `name=full`). `True` is the default variant used when a column
/// is requested bare.
#[derive(Debug, Clone, Copy)]
pub struct ColumnVariant {
    pub key: &'static str,
    pub sql: &'static str,
    pub joins: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub variants: &'static [ColumnVariant],
    /// `var:` columns: the user supplies the column expression directly
    /// (e.g. `exif=var:hasgps`), only the joins are fixed.
    pub var_joins: Option<&'static [&'static str]>,
}

/// Identifies which value-transformer function a criterion uses. The
/// registry only carries this tag; `compiler` owns the actual dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriterionKind {
    /// No transform: the quote-stripped raw value fills the lone `%s`.
    Raw,
    OperParseDate,
    OperLocalDateToLrstamp,
    OperUtcDateToLrstamp,
    BoolToEqual,
    ValueOrNull,
    LikeValueOrNull,
    ValueOrNotEqual,
    Rating,
    Flag,
    MetaStatus,
    Stacks,
    Aperture,
    Speed,
    Gps,
    ZeroOrOne,
    HasKeywords,
    ExifIndex,
    TitleIndex,
    Published,
    CollectionType,
}

#[derive(Debug, Clone, Copy)]
pub struct CriterionSpec {
    pub name: &'static str,
    /// Join clauses, possibly containing the `{n}` occurrence placeholder
    /// for criteria that may be repeated (`keyword`, `collection`).
    pub joins: &'static [&'static str],
    /// The WHERE fragment template. May contain `{n}` and any number of
    /// `%s` placeholders (filled in order from the transform's output).
    pub where_template: &'static str,
    pub kind: CriterionKind,
}

macro_rules! variant {
    ($key:expr, $sql:expr) => {
        ColumnVariant { key: $key, sql: $sql, joins: &[] }
    };
    ($key:expr, $sql:expr, [$($j:expr),+ $(,)?]) => {
        ColumnVariant { key: $key, sql: $sql, joins: &[$($j),+] }
    };
}

const FILE_JOINS: &[&str] = &["LEFT JOIN AgLibraryFile fi ON i.rootFile = fi.id_local"];
const FOLDER_JOINS: &[&str] = &[
    "LEFT JOIN AgLibraryFile fi ON i.rootFile = fi.id_local",
    "LEFT JOIN AgLibraryFolder fo ON fi.folder = fo.id_local",
];
const EXIF_JOINS: &[&str] = &["LEFT JOIN AgHarvestedExifMetadata em ON i.id_local = em.image"];
const CAMERA_JOINS: &[&str] = &[
    "LEFT JOIN AgHarvestedExifMetadata em ON i.id_local = em.image",
    "LEFT JOIN AgInternedExifCameraModel cm ON cm.id_local = em.cameraModelRef",
];
const CAMERA_SN_JOINS: &[&str] = &[
    "LEFT JOIN AgHarvestedExifMetadata em ON i.id_local = em.image",
    "LEFT JOIN AgInternedExifCameraSN csn ON csn.id_local = em.cameraSNRef",
];
const LENS_JOINS: &[&str] = &[
    "LEFT JOIN AgHarvestedExifMetadata em ON i.id_local = em.image",
    "LEFT JOIN AgInternedExifLens el ON el.id_local = em.lensRef",
];
const CREATOR_JOINS: &[&str] = &[
    "LEFT JOIN AgHarvestedIptcMetadata im ON i.id_local = im.image",
    "LEFT JOIN AgInternedIptcCreator iic ON im.creatorRef = iic.id_local",
];
const IPTC_JOINS: &[&str] = &["LEFT JOIN AgLibraryIPTC iptc ON i.id_local = iptc.image"];
const AM_JOINS: &[&str] = &["LEFT JOIN Adobe_AdditionalMetadata am ON i.id_local = am.image"];
const FSI_JOINS: &[&str] = &["LEFT JOIN AgLibraryFolderStackImage fsi ON i.id_local = fsi.image"];
const MSI_JOINS: &[&str] = &["LEFT JOIN AgMetadataSearchIndex msi ON i.id_local = msi.image"];
const IDS_JOINS: &[&str] = &["LEFT JOIN Adobe_imageDevelopSettings ids ON ids.image = i.id_local"];
const PUB_JOINS: &[&str] = &[
    "LEFT JOIN AgLibraryPublishedCollectionImage pci ON pci.image = i.id_local",
    "LEFT JOIN AgLibraryPublishedCollection pc ON pc.id_local = pci.collection",
];
const PCI_JOINS: &[&str] = &["LEFT JOIN AgLibraryPublishedCollectionImage pci ON pci.image = i.id_local"];
const RM_JOINS: &[&str] = &["LEFT JOIN AgRemotePhoto rm ON i.id_local = rm.photo"];
const IMPORT_JOINS: &[&str] = &[
    "LEFT JOIN AgLibraryImportImage impim ON i.id_local = impim.image",
    "LEFT JOIN AgLibraryImport imp ON impim.import = imp.id_local",
];
const CI_JOINS: &[&str] = &[
    "LEFT JOIN AgLibraryCollectionimage ci ON ci.image = i.id_local",
    "LEFT JOIN AgLibraryCollection col ON col.id_local = ci.Collection",
];

pub const PHOTO_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { name: "all", variants: &[variant!("True", "*")], var_joins: None },
    ColumnSpec {
        name: "name",
        variants: &[
            variant!(
                "True",
                "fi.baseName || \".\" || fi.extension AS name",
                ["LEFT JOIN AgLibraryFile fi ON i.rootFile = fi.id_local"]
            ),
            variant!(
                "basext",
                "fi.baseName || \".\" || fi.extension AS name",
                ["LEFT JOIN AgLibraryFile fi ON i.rootFile = fi.id_local"]
            ),
            variant!(
                "basext_vc",
                "fi.baseName || COALESCE(i.copyName, \"\") || \".\" || fi.extension AS name",
                ["LEFT JOIN AgLibraryFile fi ON i.rootFile = fi.id_local"]
            ),
            variant!(
                "base",
                "fi.baseName AS name",
                ["LEFT JOIN AgLibraryFile fi ON i.rootFile = fi.id_local"]
            ),
            variant!(
                "base_vc",
                "fi.baseName || COALESCE(i.copyName, \"\") AS name",
                ["LEFT JOIN AgLibraryFile fi ON i.rootFile = fi.id_local"]
            ),
            variant!(
                "full",
                "rf.absolutePath || fo.pathFromRoot || fi.baseName || \".\" || fi.extension AS name",
                [
                    "LEFT JOIN AgLibraryFile fi ON i.rootFile = fi.id_local",
                    "LEFT JOIN AgLibraryFolder fo ON fi.folder = fo.id_local",
                    "LEFT JOIN AgLibraryRootFolder rf ON fo.rootFolder = rf.id_local",
                ]
            ),
            variant!(
                "full_vc",
                "rf.absolutePath || fo.pathFromRoot || fi.baseName || COALESCE(i.copyName, \"\") || \".\" || fi.extension AS name",
                [
                    "LEFT JOIN AgLibraryFile fi ON i.rootFile = fi.id_local",
                    "LEFT JOIN AgLibraryFolder fo ON fi.folder = fo.id_local",
                    "LEFT JOIN AgLibraryRootFolder rf ON fo.rootFolder = rf.id_local",
                ]
            ),
        ],
        var_joins: None,
    },
    ColumnSpec { name: "vname", variants: &[variant!("True", "i.copyName AS vname")], var_joins: None },
    ColumnSpec { name: "uuid", variants: &[variant!("True", "i.id_global AS uuid")], var_joins: None },
    ColumnSpec { name: "master", variants: &[variant!("True", "i.masterImage AS master")], var_joins: None },
    ColumnSpec { name: "id", variants: &[variant!("True", "i.id_local AS id")], var_joins: None },
    ColumnSpec { name: "rating", variants: &[variant!("True", "i.rating AS rating")], var_joins: None },
    ColumnSpec { name: "colorlabel", variants: &[variant!("True", "i.colorlabels AS colorlabel")], var_joins: None },
    ColumnSpec {
        name: "flag",
        variants: &[variant!("True", "i.pick AS flag")],
        var_joins: None,
    },
    ColumnSpec { name: "datemod", variants: &[variant!("True", "i.touchtime AS datemod")], var_joins: None },
    ColumnSpec {
        name: "datehist",
        variants: &[variant!(
            "True",
            "(SELECT max(ids2.datecreated) FROM Adobe_libraryImageDevelopHistoryStep ids2 \
             WHERE ids2.image = i.id_local AND substr(name,1,4) NOT IN (\"Expo\", \"Publ\")) AS datehist"
        )],
        var_joins: None,
    },
    ColumnSpec { name: "modcount", variants: &[variant!("True", "i.touchCount AS modcount")], var_joins: None },
    ColumnSpec { name: "datecapt", variants: &[variant!("True", "i.captureTime AS datecapt")], var_joins: None },
    ColumnSpec {
        name: "xmp",
        variants: &[variant!(
            "True",
            "am.xmp AS xmp",
            ["LEFT JOIN Adobe_AdditionalMetadata am ON i.id_local = am.image"]
        )],
        var_joins: None,
    },
    ColumnSpec {
        name: "stack",
        variants: &[variant!(
            "True",
            "fsi.stack AS stack",
            ["LEFT JOIN AgLibraryFolderStackImage fsi ON i.id_local = fsi.image"]
        )],
        var_joins: None,
    },
    ColumnSpec {
        name: "stackpos",
        variants: &[variant!(
            "True",
            "fsi.position AS stackpos",
            ["LEFT JOIN AgLibraryFolderStackImage fsi ON i.id_local = fsi.image"]
        )],
        var_joins: None,
    },
    ColumnSpec {
        name: "keywords",
        variants: &[variant!(
            "True",
            "(SELECT GROUP_CONCAT(kwdef.name) FROM AgLibraryKeywordImage kwimg \
             JOIN AgLibraryKeyword kwdef ON kwdef.id_local = kwimg.tag \
             WHERE kwimg.image = i.id_local) AS keywords"
        )],
        var_joins: None,
    },
    ColumnSpec {
        name: "collections",
        variants: &[variant!(
            "True",
            "(SELECT GROUP_CONCAT(col.name) FROM AgLibraryCollection col \
             JOIN AgLibraryCollectionimage ci ON ci.collection = col.id_local \
             WHERE ci.image = i.id_local) AS collections"
        )],
        var_joins: None,
    },
    ColumnSpec {
        name: "camera",
        variants: &[variant!("True", "cm.value AS camera", [
            "LEFT JOIN AgHarvestedExifMetadata em ON i.id_local = em.image",
            "LEFT JOIN AgInternedExifCameraModel cm ON cm.id_local = em.cameraModelRef",
        ])],
        var_joins: None,
    },
    ColumnSpec {
        name: "camerasn",
        variants: &[variant!("True", "csn.value AS camerasn", [
            "LEFT JOIN AgHarvestedExifMetadata em ON i.id_local = em.image",
            "LEFT JOIN AgInternedExifCameraSN csn ON csn.id_local = em.cameraSNRef",
        ])],
        var_joins: None,
    },
    ColumnSpec {
        name: "lens",
        variants: &[variant!("True", "el.value AS lens", [
            "LEFT JOIN AgHarvestedExifMetadata em ON i.id_local = em.image",
            "LEFT JOIN AgInternedExifLens el ON el.id_local = em.lensRef",
        ])],
        var_joins: None,
    },
    ColumnSpec {
        name: "iso",
        variants: &[variant!("True", "em.isoSpeedRating AS iso", ["LEFT JOIN AgHarvestedExifMetadata em ON i.id_local = em.image"])],
        var_joins: None,
    },
    ColumnSpec {
        name: "focal",
        variants: &[variant!("True", "em.focalLength AS focal", ["LEFT JOIN AgHarvestedExifMetadata em ON i.id_local = em.image"])],
        var_joins: None,
    },
    ColumnSpec {
        name: "aperture",
        variants: &[variant!("True", "em.aperture AS aperture", ["LEFT JOIN AgHarvestedExifMetadata em ON i.id_local = em.image"])],
        var_joins: None,
    },
    ColumnSpec {
        name: "speed",
        variants: &[variant!("True", "em.shutterSpeed AS speed", ["LEFT JOIN AgHarvestedExifMetadata em ON i.id_local = em.image"])],
        var_joins: None,
    },
    ColumnSpec {
        name: "orientation",
        variants: &[variant!("True", "i.orientation AS orientation")],
        var_joins: None,
    },
    ColumnSpec {
        name: "monochrome",
        variants: &[variant!("True", "em.isMonochrome AS monochrome", ["LEFT JOIN AgHarvestedExifMetadata em ON i.id_local = em.image"])],
        var_joins: None,
    },
    ColumnSpec {
        name: "flash",
        variants: &[variant!("True", "em.flashFired AS flash", ["LEFT JOIN AgHarvestedExifMetadata em ON i.id_local = em.image"])],
        var_joins: None,
    },
    ColumnSpec {
        name: "dims",
        variants: &[variant!(
            "True",
            "(SELECT CASE \
             WHEN ids.croppedWidth <> \"uncropped\" AND i.orientation IN (\"AB\",\"BA\",\"CD\",\"DC\") THEN CAST(ids.croppedWidth AS int) || \"x\" || CAST(ids.croppedHeight AS int) \
             WHEN ids.croppedWidth <> \"uncropped\" AND i.orientation IN (\"AD\",\"DA\",\"BC\",\"CB\") THEN CAST(ids.croppedHeight AS int) || \"x\" || CAST(ids.croppedWidth AS int) \
             WHEN ids.croppedWidth = \"uncropped\" AND i.orientation IN (\"AB\",\"BA\",\"CD\",\"DC\") THEN CAST(i.fileWidth AS int) || \"x\" || CAST(i.fileHeight AS int) \
             WHEN ids.croppedWidth = \"uncropped\" AND i.orientation IN (\"AD\",\"DA\",\"BC\",\"CB\") THEN CAST(i.fileHeight AS int) || \"x\" || CAST(i.fileWidth AS int) \
             ELSE CAST(i.fileWidth AS int) || \"x\" || CAST(i.fileHeight AS int) END) AS dims",
            ["LEFT JOIN Adobe_imageDevelopSettings ids ON ids.image = i.id_local"]
        )],
        var_joins: None,
    },
    ColumnSpec { name: "aspectratio", variants: &[variant!("True", "i.aspectRatioCache AS aspectratio")], var_joins: None },
    ColumnSpec {
        name: "creator",
        variants: &[variant!("True", "iic.value AS creator", [
            "LEFT JOIN AgHarvestedIptcMetadata im ON i.id_local = im.image",
            "LEFT JOIN AgInternedIptcCreator iic ON im.creatorRef = iic.id_local",
        ])],
        var_joins: None,
    },
    ColumnSpec {
        name: "caption",
        variants: &[variant!("True", "iptc.caption AS caption", ["LEFT JOIN AgLibraryIPTC iptc ON i.id_local = iptc.image"])],
        var_joins: None,
    },
    ColumnSpec {
        name: "copyright",
        variants: &[variant!("True", "iptc.copyright AS copyright", ["LEFT JOIN AgLibraryIPTC iptc ON i.id_local = iptc.image"])],
        var_joins: None,
    },
    ColumnSpec {
        name: "hasgps",
        variants: &[variant!("True", "em.hasGps AS hasgps", ["LEFT JOIN AgHarvestedExifMetadata em ON i.id_local = em.image"])],
        var_joins: None,
    },
    ColumnSpec {
        name: "latitude",
        variants: &[variant!("True", "em.gpsLatitude AS latitude", ["LEFT JOIN AgHarvestedExifMetadata em ON i.id_local = em.image"])],
        var_joins: None,
    },
    ColumnSpec {
        name: "longitude",
        variants: &[variant!("True", "em.gpsLongitude AS longitude", ["LEFT JOIN AgHarvestedExifMetadata em ON i.id_local = em.image"])],
        var_joins: None,
    },
    ColumnSpec {
        name: "exif",
        variants: &[],
        var_joins: Some(EXIF_JOINS),
    },
    ColumnSpec {
        name: "pubcollection",
        variants: &[variant!("True", "pc.name AS pubcollection", [
            "LEFT JOIN AgLibraryPublishedCollectionImage pci ON pci.image = i.id_local",
            "LEFT JOIN AgLibraryPublishedCollection pc ON pc.id_local = pci.collection",
        ])],
        var_joins: None,
    },
    ColumnSpec {
        name: "pubname",
        variants: &[variant!("True", "rm.remoteId AS pubname", ["LEFT JOIN AgRemotePhoto rm ON i.id_local = rm.photo"])],
        var_joins: None,
    },
    ColumnSpec {
        name: "pubtime",
        variants: &[variant!(
            "True",
            "(SELECT substr(rm.url, pos + 1) FROM (SELECT instr(rm.url, \"/\") AS pos)) AS pubtime",
            ["LEFT JOIN AgRemotePhoto rm ON i.id_local = rm.photo"]
        )],
        var_joins: None,
    },
    ColumnSpec {
        name: "pubposition",
        variants: &[variant!("True", "pci.positionInCollection AS pubposition", [
            "LEFT JOIN AgLibraryPublishedCollectionImage pci ON pci.image = i.id_local",
        ])],
        var_joins: None,
    },
    ColumnSpec {
        name: "extfile",
        variants: &[variant!(
            "True",
            "fi.sidecarExtensions AS extfile",
            ["LEFT JOIN AgLibraryFile fi ON i.rootFile = fi.id_local"]
        )],
        var_joins: None,
    },
    ColumnSpec {
        name: "location",
        variants: &[variant!("True", "iptc.location AS location", ["LEFT JOIN AgLibraryIPTC iptc ON i.id_local = iptc.image"])],
        var_joins: None,
    },
    ColumnSpec {
        name: "city",
        variants: &[variant!("True", "iptc.city AS city", ["LEFT JOIN AgLibraryIPTC iptc ON i.id_local = iptc.image"])],
        var_joins: None,
    },
    ColumnSpec {
        name: "country",
        variants: &[variant!("True", "iptc.country AS country", ["LEFT JOIN AgLibraryIPTC iptc ON i.id_local = iptc.image"])],
        var_joins: None,
    },
    ColumnSpec {
        name: "state",
        variants: &[variant!("True", "iptc.state AS state", ["LEFT JOIN AgLibraryIPTC iptc ON i.id_local = iptc.image"])],
        var_joins: None,
    },
    ColumnSpec {
        name: "duration",
        variants: &[variant!(
            "True",
            "vi.duration AS duration",
            ["LEFT JOIN AgVideoInfo vi ON vi.image = i.id_local"]
        )],
        var_joins: None,
    },
];

pub const PHOTO_CRITERIA: &[CriterionSpec] = &[
    CriterionSpec { name: "name", joins: FILE_JOINS, where_template: "UPPER(fi.baseName) LIKE \"%s\"", kind: CriterionKind::Raw },
    CriterionSpec { name: "exactname", joins: FILE_JOINS, where_template: "UPPER(fi.baseName) = \"%s\"", kind: CriterionKind::Raw },
    CriterionSpec { name: "ext", joins: FILE_JOINS, where_template: "UPPER(fi.extension) LIKE \"%s\"", kind: CriterionKind::Raw },
    CriterionSpec { name: "exact_ext", joins: FILE_JOINS, where_template: "UPPER(fi.extension) = \"%s\"", kind: CriterionKind::Raw },
    CriterionSpec { name: "id", joins: &[], where_template: "i.id_local = %s", kind: CriterionKind::Raw },
    CriterionSpec { name: "uuid", joins: &[], where_template: "i.id_global = \"%s\"", kind: CriterionKind::Raw },
    CriterionSpec { name: "datecapt", joins: &[], where_template: "%s", kind: CriterionKind::OperParseDate },
    CriterionSpec { name: "datemod", joins: &[], where_template: "i.touchtime %s %s", kind: CriterionKind::OperLocalDateToLrstamp },
    CriterionSpec { name: "modcount", joins: &[], where_template: "i.touchcount %s", kind: CriterionKind::Raw },
    CriterionSpec { name: "videos", joins: &[], where_template: "i.fileFormat %s \"VIDEO\"", kind: CriterionKind::BoolToEqual },
    CriterionSpec { name: "vcopies", joins: &[], where_template: "i.masterImage %s", kind: CriterionKind::ValueOrNull },
    CriterionSpec { name: "rating", joins: &[], where_template: "%s", kind: CriterionKind::Rating },
    CriterionSpec { name: "colorlabel", joins: &[], where_template: "i.colorlabels %s %s", kind: CriterionKind::ValueOrNotEqual },
    CriterionSpec { name: "flag", joins: &[], where_template: "i.pick %s", kind: CriterionKind::Flag },
    CriterionSpec { name: "title", joins: MSI_JOINS, where_template: "%s", kind: CriterionKind::TitleIndex },
    CriterionSpec { name: "caption", joins: IPTC_JOINS, where_template: "iptc.caption %s", kind: CriterionKind::LikeValueOrNull },
    CriterionSpec { name: "creator", joins: CREATOR_JOINS, where_template: "iic.value LIKE \"%s\"", kind: CriterionKind::Raw },
    CriterionSpec { name: "iso", joins: EXIF_JOINS, where_template: "em.isoSpeedRating %s", kind: CriterionKind::Raw },
    CriterionSpec { name: "focal", joins: EXIF_JOINS, where_template: "em.focalLength %s", kind: CriterionKind::Raw },
    CriterionSpec { name: "aperture", joins: EXIF_JOINS, where_template: "em.aperture %s", kind: CriterionKind::Aperture },
    CriterionSpec { name: "speed", joins: EXIF_JOINS, where_template: "em.shutterSpeed %s", kind: CriterionKind::Speed },
    CriterionSpec { name: "camera", joins: CAMERA_JOINS, where_template: "cm.value LIKE \"%s\"", kind: CriterionKind::Raw },
    CriterionSpec { name: "camerasn", joins: CAMERA_SN_JOINS, where_template: "csn.value LIKE \"%s\"", kind: CriterionKind::Raw },
    CriterionSpec { name: "lens", joins: LENS_JOINS, where_template: "el.value LIKE \"%s\"", kind: CriterionKind::Raw },
    // width/height filter the virtual `dims` alias, so the `dims` column must
    // be part of the same query.
    CriterionSpec { name: "width", joins: IDS_JOINS, where_template: "CAST(substr(dims, 1, instr(dims, \"x\")-1) AS int) %s", kind: CriterionKind::Raw },
    CriterionSpec { name: "height", joins: IDS_JOINS, where_template: "CAST(substr(dims, instr(dims, \"x\")+1) AS int) %s", kind: CriterionKind::Raw },
    CriterionSpec { name: "aspectratio", joins: &[], where_template: "i.aspectRatioCache %s", kind: CriterionKind::Raw },
    CriterionSpec { name: "orientation", joins: &[], where_template: "i.orientation = \"%s\"", kind: CriterionKind::Raw },
    CriterionSpec { name: "hasgps", joins: EXIF_JOINS, where_template: "em.hasGps = %s", kind: CriterionKind::ZeroOrOne },
    CriterionSpec { name: "gps", joins: EXIF_JOINS, where_template: "%s", kind: CriterionKind::Gps },
    CriterionSpec { name: "import", joins: IMPORT_JOINS, where_template: "imp.id_local = %s", kind: CriterionKind::Raw },
    CriterionSpec { name: "folder", joins: FOLDER_JOINS, where_template: "fo.pathFromRoot LIKE \"%s\"", kind: CriterionKind::Raw },
    CriterionSpec { name: "idfolder", joins: FOLDER_JOINS, where_template: "fo.id_local = %s", kind: CriterionKind::Raw },
    CriterionSpec { name: "idcollection", joins: CI_JOINS, where_template: "col.id_local = %s", kind: CriterionKind::Raw },
    CriterionSpec { name: "collection", joins: &[
        "LEFT JOIN AgLibraryCollectionimage ci{n} ON ci{n}.image = i.id_local",
        "LEFT JOIN AgLibraryCollection col{n} ON col{n}.id_local = ci{n}.Collection",
    ], where_template: "col{n}.name LIKE \"%s\"", kind: CriterionKind::Raw },
    CriterionSpec { name: "idpubcollection", joins: PUB_JOINS, where_template: "pc.id_local = %s", kind: CriterionKind::Raw },
    CriterionSpec { name: "pubcollection", joins: PUB_JOINS, where_template: "%s", kind: CriterionKind::Published },
    CriterionSpec { name: "pubtime", joins: RM_JOINS, where_template: "CAST((SELECT substr(rm.url, pos + 1) FROM (SELECT instr(rm.url, \"/\") AS pos)) AS INTEGER) %s %s", kind: CriterionKind::OperUtcDateToLrstamp },
    CriterionSpec { name: "pubposition", joins: PCI_JOINS, where_template: "pci.positionInCollection %s", kind: CriterionKind::Raw },
    CriterionSpec { name: "metastatus", joins: AM_JOINS, where_template: "%s", kind: CriterionKind::MetaStatus },
    CriterionSpec { name: "extfile", joins: FILE_JOINS, where_template: "UPPER(fi.sidecarExtensions) LIKE \"%s\"", kind: CriterionKind::Raw },
    CriterionSpec { name: "stacks", joins: FSI_JOINS, where_template: "%s", kind: CriterionKind::Stacks },
    CriterionSpec { name: "keyword", joins: &[
        "LEFT JOIN AgLibraryKeywordImage kwi{n} ON i.id_local = kwi{n}.image",
        "LEFT JOIN AgLibraryKeyword kw{n} ON kw{n}.id_local = kwi{n}.tag",
    ], where_template: "kw{n}.name LIKE \"%s\"", kind: CriterionKind::Raw },
    // haskeywords adds its own join for the "no keywords" case; see the
    // HasKeywords transform.
    CriterionSpec { name: "haskeywords", joins: &[], where_template: "%s", kind: CriterionKind::HasKeywords },
    CriterionSpec { name: "exifindex", joins: MSI_JOINS, where_template: "%s", kind: CriterionKind::ExifIndex },
];

pub const COLLECTION_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { name: "all", variants: &[variant!("True", "*")], var_joins: None },
    ColumnSpec { name: "name", variants: &[variant!("True", "col.name AS name")], var_joins: None },
    ColumnSpec { name: "id", variants: &[variant!("True", "col.id_local AS id")], var_joins: None },
    ColumnSpec { name: "type", variants: &[variant!("True", "col.creationId AS type")], var_joins: None },
    ColumnSpec { name: "parent", variants: &[variant!("True", "col.parent AS parent")], var_joins: None },
    ColumnSpec {
        name: "smart",
        variants: &[variant!(
            "True",
            "cont.content AS content",
            ["JOIN AgLibraryCollectionContent cont ON col.id_local = cont.collection"]
        )],
        var_joins: None,
    },
];

pub const COLLECTION_CRITERIA: &[CriterionSpec] = &[
    CriterionSpec { name: "name", joins: &[], where_template: "col.name LIKE \"%s\"", kind: CriterionKind::Raw },
    CriterionSpec { name: "id", joins: &[], where_template: "col.id_local = %s", kind: CriterionKind::Raw },
    CriterionSpec { name: "type", joins: &[], where_template: "%s", kind: CriterionKind::CollectionType },
    CriterionSpec {
        name: "id4smart",
        joins: &["JOIN AgLibraryCollectionContent cont ON col.id_local = cont.collection"],
        where_template: "col.id_local = %s AND cont.owningModule = \"ag.library.smart_collection\"",
        kind: CriterionKind::Raw,
    },
    CriterionSpec {
        name: "name4smart",
        joins: &["JOIN AgLibraryCollectionContent cont ON col.id_local = cont.collection"],
        where_template: "col.name LIKE \"%s\" AND cont.owningModule = \"ag.library.smart_collection\"",
        kind: CriterionKind::Raw,
    },
];

pub fn columns_for(table: TableKind) -> &'static [ColumnSpec] {
    match table {
        TableKind::Photo => PHOTO_COLUMNS,
        TableKind::Collection => COLLECTION_COLUMNS,
    }
}

pub fn criteria_for(table: TableKind) -> &'static [CriterionSpec] {
    match table {
        TableKind::Photo => PHOTO_CRITERIA,
        TableKind::Collection => COLLECTION_CRITERIA,
    }
}

/// Case-insensitive: the lexer lower-cases every key it reads.
pub fn lookup_column(table: TableKind, key: &str) -> Option<&'static ColumnSpec> {
    columns_for(table).iter().find(|c| c.name.eq_ignore_ascii_case(key))
}

pub fn lookup_criterion(table: TableKind, key: &str) -> Option<&'static CriterionSpec> {
    criteria_for(table).iter().find(|c| c.name.eq_ignore_ascii_case(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_dsl_criterion_is_registered() {
        let vocabulary = [
            "name", "exactname", "ext", "exact_ext", "id", "uuid", "datecapt", "datemod",
            "modcount", "videos", "vcopies", "rating", "colorlabel", "flag", "title", "caption",
            "creator", "iso", "focal", "aperture", "speed", "camera", "camerasn", "lens", "width",
            "height", "aspectratio", "orientation", "hasgps", "gps", "import", "folder",
            "idfolder", "idcollection", "collection", "idpubcollection", "pubcollection",
            "pubtime", "pubposition", "metastatus", "extfile", "stacks", "keyword", "haskeywords",
            "exifindex",
        ];
        for key in vocabulary {
            assert!(
                lookup_criterion(TableKind::Photo, key).is_some(),
                "missing criterion {}",
                key
            );
        }
    }

    #[test]
    fn every_photo_column_is_registered() {
        let vocabulary = [
            "name", "uuid", "id", "rating", "colorlabel", "flag", "datemod", "datehist",
            "datecapt", "modcount", "master", "xmp", "vname", "stack", "stackpos", "keywords",
            "collections", "camera", "camerasn", "lens", "iso", "focal", "aperture", "speed",
            "orientation", "monochrome", "flash", "dims", "aspectratio", "creator", "caption",
            "copyright", "hasgps", "latitude", "longitude", "exif", "pubcollection", "pubname",
            "pubtime", "pubposition", "extfile", "location", "city", "country", "state",
            "duration",
        ];
        for key in vocabulary {
            assert!(lookup_column(TableKind::Photo, key).is_some(), "missing column {}", key);
        }
    }

    #[test]
    fn name_column_carries_the_virtual_copy_variants() {
        let spec = lookup_column(TableKind::Photo, "name").unwrap();
        for key in ["True", "basext", "basext_vc", "base", "base_vc", "full", "full_vc"] {
            assert!(spec.variants.iter().any(|v| v.key == key), "missing variant {}", key);
        }
    }

    #[test]
    fn collection_registry_has_name_default() {
        let col = lookup_column(TableKind::Collection, "name").unwrap();
        assert_eq!(col.variants[0].sql, "col.name AS name");
    }

    #[test]
    fn repeatable_criteria_carry_the_n_placeholder() {
        for key in ["keyword", "collection"] {
            let spec = lookup_criterion(TableKind::Photo, key).unwrap();
            assert!(spec.joins[0].contains("{n}"), "{} joins lack {{n}}", key);
            assert!(spec.where_template.contains("{n}"), "{} template lacks {{n}}", key);
        }
    }

    #[test]
    fn every_criterion_join_table_is_referenced_by_its_template_or_shared() {
        // ext references fi, so its joins must include the AgLibraryFile join.
        let spec = lookup_criterion(TableKind::Photo, "ext").unwrap();
        assert!(spec.joins.iter().any(|j| j.contains("AgLibraryFile fi")));
    }
}
