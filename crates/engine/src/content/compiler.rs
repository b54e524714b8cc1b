use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};

use crate::asset_keys::validate_asset_key;

use super::database::{DefDatabase, ItemData, ItemDefId, PlantData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownDefType,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    DuplicateDef,
    StageCountMismatch,
}

#[derive(Debug, Clone)]
pub struct ContentCompileError {
    pub code: ContentErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ContentCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentCompileError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DefKind {
    Item,
    Plant,
}

impl DefKind {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ItemDef" => Some(Self::Item),
            "PlantDef" => Some(Self::Plant),
            _ => None,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Self::Item => "ItemDef",
            Self::Plant => "PlantDef",
        }
    }
}

#[derive(Debug, Clone)]
struct PendingItemDef {
    def_name: String,
    label: String,
    sprite: String,
    plant: Option<PlantData>,
    file_path: PathBuf,
    location: SourceLocation,
}

/// Position-aware error construction for one XML document.
struct DocContext<'a, 'input> {
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

impl DocContext<'_, '_> {
    fn location_of(&self, node: Node<'_, '_>) -> SourceLocation {
        let pos = self.doc.text_pos_at(node.range().start);
        SourceLocation {
            line: pos.row as usize,
            column: pos.col as usize,
        }
    }

    fn error_at(
        &self,
        code: ContentErrorCode,
        message: String,
        node: Node<'_, '_>,
    ) -> ContentCompileError {
        ContentCompileError {
            code,
            message,
            file_path: self.file_path.to_path_buf(),
            location: Some(self.location_of(node)),
        }
    }

    fn required_text(
        &self,
        node: Node<'_, '_>,
        field_name: &str,
    ) -> Result<String, ContentCompileError> {
        let value = node.text().map(str::trim).unwrap_or_default().to_string();
        if value.is_empty() {
            return Err(self.error_at(
                ContentErrorCode::MissingField,
                format!("field <{field_name}> must not be empty"),
                node,
            ));
        }
        Ok(value)
    }

    fn asset_key(
        &self,
        node: Node<'_, '_>,
        field_name: &str,
    ) -> Result<String, ContentCompileError> {
        let value = self.required_text(node, field_name)?;
        validate_asset_key(&value).map_err(|error| {
            self.error_at(
                ContentErrorCode::InvalidValue,
                format!("invalid asset key '{value}' in <{field_name}>: {error}"),
                node,
            )
        })?;
        Ok(value)
    }

    fn asset_key_list(&self, node: Node<'_, '_>) -> Result<Vec<String>, ContentCompileError> {
        let field_name = node.tag_name().name();
        let mut keys = Vec::new();
        for entry in node.children().filter(|child| child.is_element()) {
            if entry.tag_name().name() != "li" {
                return Err(self.error_at(
                    ContentErrorCode::UnknownField,
                    format!(
                        "unexpected <{}> in <{field_name}>; entries must be <li>",
                        entry.tag_name().name()
                    ),
                    entry,
                ));
            }
            keys.push(self.asset_key(entry, field_name)?);
        }
        Ok(keys)
    }
}

/// Compiles every `*.xml` file below `base_dir` into one database.
///
/// Files are visited in sorted relative-path order and ids are assigned in
/// `defName` order, so the result does not depend on directory iteration.
pub fn compile_def_database(base_dir: &Path) -> Result<DefDatabase, ContentCompileError> {
    let xml_files =
        collect_xml_files_sorted(base_dir).map_err(|error| read_error(error.path, error.source))?;

    let mut merged = BTreeMap::<String, PendingItemDef>::new();
    for xml_file in xml_files {
        let raw = fs::read_to_string(&xml_file)
            .map_err(|source| read_error(xml_file.clone(), source))?;
        for def in parse_defs_document(&xml_file, &raw)? {
            if let Some(existing) = merged.get(&def.def_name) {
                return Err(ContentCompileError {
                    code: ContentErrorCode::DuplicateDef,
                    message: format!(
                        "duplicate defName '{}'; first defined in {} at line {}",
                        def.def_name,
                        existing.file_path.display(),
                        existing.location.line
                    ),
                    file_path: def.file_path.clone(),
                    location: Some(def.location),
                });
            }
            merged.insert(def.def_name.clone(), def);
        }
    }

    let items = merged
        .into_values()
        .map(|def| ItemData {
            id: ItemDefId(0),
            def_name: def.def_name,
            label: def.label,
            sprite: def.sprite,
            plant: def.plant,
        })
        .collect::<Vec<_>>();

    Ok(DefDatabase::from_items(items))
}

fn parse_defs_document(
    file_path: &Path,
    raw: &str,
) -> Result<Vec<PendingItemDef>, ContentCompileError> {
    let doc = Document::parse(raw).map_err(|error| ContentCompileError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;
    let ctx = DocContext {
        file_path,
        doc: &doc,
    };

    let root = doc.root_element();
    if root.tag_name().name() != "Defs" {
        return Err(ctx.error_at(
            ContentErrorCode::InvalidRoot,
            "root element must be <Defs>".to_string(),
            root,
        ));
    }

    let mut defs = Vec::<PendingItemDef>::new();
    for child in root.children().filter(|node| node.is_element()) {
        let Some(kind) = DefKind::from_tag(child.tag_name().name()) else {
            return Err(ctx.error_at(
                ContentErrorCode::UnknownDefType,
                format!(
                    "unsupported def type <{}>; expected <ItemDef> or <PlantDef>",
                    child.tag_name().name()
                ),
                child,
            ));
        };
        defs.push(parse_item_def(&ctx, kind, child)?);
    }

    Ok(defs)
}

fn parse_item_def(
    ctx: &DocContext<'_, '_>,
    kind: DefKind,
    node: Node<'_, '_>,
) -> Result<PendingItemDef, ContentCompileError> {
    let tag = kind.tag();
    let mut seen_fields = HashSet::<&str>::new();
    let mut def_name: Option<String> = None;
    let mut label: Option<String> = None;
    let mut sprite: Option<String> = None;
    let mut growth_duration: Option<f32> = None;
    let mut meshes: Option<Vec<String>> = None;
    let mut materials: Option<Vec<String>> = None;

    for field in node.children().filter(|child| child.is_element()) {
        let field_name = field.tag_name().name();
        if !seen_fields.insert(field_name) {
            return Err(ctx.error_at(
                ContentErrorCode::DuplicateField,
                format!("duplicate field <{field_name}> in <{tag}>"),
                field,
            ));
        }

        match (kind, field_name) {
            (_, "defName") => def_name = Some(ctx.required_text(field, field_name)?),
            (_, "label") => label = Some(ctx.required_text(field, field_name)?),
            (_, "sprite") => sprite = Some(ctx.asset_key(field, field_name)?),
            (DefKind::Plant, "growthDuration") => {
                let value = ctx.required_text(field, field_name)?;
                let parsed = value.parse::<f32>().map_err(|_| {
                    ctx.error_at(
                        ContentErrorCode::InvalidValue,
                        format!("growthDuration '{value}' is not a valid number"),
                        field,
                    )
                })?;
                if !parsed.is_finite() || parsed < 0.0 {
                    return Err(ctx.error_at(
                        ContentErrorCode::InvalidValue,
                        "growthDuration must be finite and >= 0".to_string(),
                        field,
                    ));
                }
                growth_duration = Some(parsed);
            }
            (DefKind::Plant, "growingStateMeshes") => meshes = Some(ctx.asset_key_list(field)?),
            (DefKind::Plant, "growingStateMaterials") => {
                materials = Some(ctx.asset_key_list(field)?)
            }
            _ => {
                return Err(ctx.error_at(
                    ContentErrorCode::UnknownField,
                    format!("unknown field <{field_name}> in <{tag}>"),
                    field,
                ))
            }
        }
    }

    let missing = |field_name: &str| {
        ctx.error_at(
            ContentErrorCode::MissingField,
            format!("missing required field <{field_name}> in <{tag}>"),
            node,
        )
    };
    let def_name = def_name.ok_or_else(|| missing("defName"))?;
    let label = label.ok_or_else(|| missing("label"))?;
    let sprite = sprite.ok_or_else(|| missing("sprite"))?;

    let plant = match kind {
        DefKind::Item => None,
        DefKind::Plant => {
            let growth_duration_seconds = growth_duration.ok_or_else(|| missing("growthDuration"))?;
            let growing_state_meshes = meshes.ok_or_else(|| missing("growingStateMeshes"))?;
            let growing_state_materials =
                materials.ok_or_else(|| missing("growingStateMaterials"))?;
            if growing_state_meshes.len() != growing_state_materials.len() {
                return Err(ctx.error_at(
                    ContentErrorCode::StageCountMismatch,
                    format!(
                        "plant '{def_name}' has {} growing-state meshes but {} materials",
                        growing_state_meshes.len(),
                        growing_state_materials.len()
                    ),
                    node,
                ));
            }
            Some(PlantData {
                growth_duration_seconds,
                growing_state_meshes,
                growing_state_materials,
            })
        }
    };

    Ok(PendingItemDef {
        def_name,
        label,
        sprite,
        plant,
        file_path: ctx.file_path.to_path_buf(),
        location: ctx.location_of(node),
    })
}

struct ReadError {
    path: PathBuf,
    source: std::io::Error,
}

fn collect_xml_files_sorted(root: &Path) -> Result<Vec<PathBuf>, ReadError> {
    let mut files = Vec::<PathBuf>::new();
    collect_recursive(root, &mut files)?;
    files.sort_by_cached_key(|path| normalize_rel_path(path.strip_prefix(root).unwrap_or(path)));
    Ok(files)
}

fn collect_recursive(current: &Path, files: &mut Vec<PathBuf>) -> Result<(), ReadError> {
    let entries = fs::read_dir(current).map_err(|source| ReadError {
        path: current.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| ReadError {
            path: current.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_recursive(&path, files)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        {
            files.push(path);
        }
    }
    Ok(())
}

fn normalize_rel_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_error(path: PathBuf, source: std::io::Error) -> ContentCompileError {
    ContentCompileError {
        code: ContentErrorCode::ReadFile,
        message: format!("failed to read XML content: {source}"),
        file_path: path,
        location: None,
    }
}
