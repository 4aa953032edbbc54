use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use glam::Vec3;
use roxmltree::{Document, Node};

use crate::app::{EnemyKind, EnemyStats, PowerUpKind};

use super::database::{
    MissionDatabase, PathDefinition, PowerUpPlacement, SceneDefinition, SceneSpawn, SpawnTrigger,
};

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
    UnknownReference,
    EmptyScene,
    NoScenes,
}

#[derive(Debug, Clone)]
pub struct ContentCompileError {
    pub code: ContentErrorCode,
    pub message: String,
    pub mission_id: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ContentCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (mission={}, file={}, line={}, column={})",
                self.code,
                self.message,
                self.mission_id,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (mission={}, file={})",
                self.code,
                self.message,
                self.mission_id,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentCompileError {}

struct DocContext<'a, 'input> {
    mission_id: &'a str,
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

impl DocContext<'_, '_> {
    fn location(&self, node: Node<'_, '_>) -> SourceLocation {
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
        self.error_at_location(code, message, Some(self.location(node)))
    }

    fn error_at_location(
        &self,
        code: ContentErrorCode,
        message: String,
        location: Option<SourceLocation>,
    ) -> ContentCompileError {
        ContentCompileError {
            code,
            message,
            mission_id: self.mission_id.to_string(),
            file_path: self.file_path.to_path_buf(),
            location,
        }
    }
}

#[derive(Debug)]
struct PendingScene {
    id: String,
    title: String,
    camera_position: Vec3,
    camera_look_at: Vec3,
    path_refs: Vec<(String, SourceLocation)>,
    spawns: Vec<SceneSpawn>,
    power_ups: Vec<PowerUpPlacement>,
    location: SourceLocation,
}

pub fn compile_mission_document(
    mission_id: &str,
    file_path: &Path,
    raw: &str,
) -> Result<MissionDatabase, ContentCompileError> {
    let doc = Document::parse(raw).map_err(|error| ContentCompileError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        mission_id: mission_id.to_string(),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;
    let cx = DocContext {
        mission_id,
        file_path,
        doc: &doc,
    };

    let root = doc.root_element();
    if root.tag_name().name() != "Mission" {
        return Err(cx.error_at(
            ContentErrorCode::InvalidRoot,
            "root element must be <Mission>".to_string(),
            root,
        ));
    }

    let mut enemy_stats = HashMap::<EnemyKind, EnemyStats>::new();
    let mut paths = Vec::<PathDefinition>::new();
    let mut path_ids = HashMap::<String, usize>::new();
    let mut pending_scenes = Vec::<PendingScene>::new();
    let mut scene_ids = HashSet::<String>::new();

    for child in element_children(root) {
        match child.tag_name().name() {
            "EnemyDef" => {
                let (kind, stats) = parse_enemy_def(&cx, child)?;
                if enemy_stats.insert(kind, stats).is_some() {
                    return Err(cx.error_at(
                        ContentErrorCode::DuplicateDef,
                        format!("duplicate EnemyDef for kind '{}'", kind.as_token()),
                        child,
                    ));
                }
            }
            "PathDef" => {
                let path = parse_path_def(&cx, child)?;
                if path_ids.insert(path.id.clone(), paths.len()).is_some() {
                    return Err(cx.error_at(
                        ContentErrorCode::DuplicateDef,
                        format!("duplicate PathDef '{}'", path.id),
                        child,
                    ));
                }
                paths.push(path);
            }
            "SceneDef" => {
                let scene = parse_scene_def(&cx, child)?;
                if !scene_ids.insert(scene.id.clone()) {
                    return Err(cx.error_at(
                        ContentErrorCode::DuplicateDef,
                        format!("duplicate SceneDef '{}'", scene.id),
                        child,
                    ));
                }
                pending_scenes.push(scene);
            }
            other => {
                return Err(cx.error_at(
                    ContentErrorCode::UnknownDefType,
                    format!(
                        "unsupported def type <{other}>; expected <EnemyDef>, <PathDef> or <SceneDef>"
                    ),
                    child,
                ))
            }
        }
    }

    if pending_scenes.is_empty() {
        return Err(cx.error_at(
            ContentErrorCode::NoScenes,
            "mission must define at least one <SceneDef>".to_string(),
            root,
        ));
    }

    let scenes = pending_scenes
        .into_iter()
        .map(|pending| resolve_scene(&cx, pending, &path_ids, &paths))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MissionDatabase::from_parts(
        mission_id.to_string(),
        enemy_stats,
        paths,
        scenes,
    ))
}

fn resolve_scene(
    cx: &DocContext<'_, '_>,
    pending: PendingScene,
    path_ids: &HashMap<String, usize>,
    paths: &[PathDefinition],
) -> Result<SceneDefinition, ContentCompileError> {
    let mut path_indices = Vec::with_capacity(pending.path_refs.len());
    for (path_id, location) in &pending.path_refs {
        let Some(index) = path_ids.get(path_id).copied() else {
            return Err(cx.error_at_location(
                ContentErrorCode::UnknownReference,
                format!(
                    "scene '{}' references unknown PathDef '{}'",
                    pending.id, path_id
                ),
                Some(*location),
            ));
        };
        path_indices.push(index);
    }

    let has_triggers = path_indices.iter().any(|index| {
        paths
            .get(*index)
            .is_some_and(|path| !path.spawn_triggers.is_empty())
    });
    if pending.spawns.is_empty() && !has_triggers {
        return Err(cx.error_at_location(
            ContentErrorCode::EmptyScene,
            format!(
                "scene '{}' has no spawns and no path spawn triggers; it could never be cleared",
                pending.id
            ),
            Some(pending.location),
        ));
    }

    Ok(SceneDefinition {
        id: pending.id,
        title: pending.title,
        camera_position: pending.camera_position,
        camera_look_at: pending.camera_look_at,
        path_indices,
        spawns: pending.spawns,
        power_ups: pending.power_ups,
    })
}

fn parse_enemy_def(
    cx: &DocContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<(EnemyKind, EnemyStats), ContentCompileError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut kind: Option<EnemyKind> = None;
    let mut max_health: Option<i32> = None;
    let mut speed: Option<f32> = None;
    let mut damage: Option<u32> = None;
    let mut score_value: Option<u32> = None;
    let mut body_height: Option<f32> = None;
    let mut hit_radius: Option<f32> = None;

    for field in element_children(node) {
        let field_name = claim_field(cx, &mut seen_fields, field, "EnemyDef")?;
        match field_name.as_str() {
            "kind" => kind = Some(parse_enemy_kind(cx, field)?),
            "maxHealth" => {
                let value = parse_u32(cx, field, "maxHealth")?;
                let value = i32::try_from(value).ok().filter(|health| *health > 0);
                let Some(value) = value else {
                    return Err(cx.error_at(
                        ContentErrorCode::InvalidValue,
                        "maxHealth must be a positive integer".to_string(),
                        field,
                    ));
                };
                max_health = Some(value);
            }
            "speed" => speed = Some(parse_non_negative_f32(cx, field, "speed")?),
            "damage" => damage = Some(parse_u32(cx, field, "damage")?),
            "scoreValue" => score_value = Some(parse_u32(cx, field, "scoreValue")?),
            "bodyHeight" => body_height = Some(parse_positive_f32(cx, field, "bodyHeight")?),
            "hitRadius" => hit_radius = Some(parse_positive_f32(cx, field, "hitRadius")?),
            _ => return Err(unknown_field(cx, field, "EnemyDef")),
        }
    }

    let Some(kind) = kind else {
        return Err(missing_field(cx, node, "kind", "EnemyDef"));
    };
    let defaults = kind.default_stats();
    Ok((
        kind,
        EnemyStats {
            max_health: max_health.unwrap_or(defaults.max_health),
            speed: speed.unwrap_or(defaults.speed),
            damage: damage.unwrap_or(defaults.damage),
            score_value: score_value.unwrap_or(defaults.score_value),
            body_height: body_height.unwrap_or(defaults.body_height),
            hit_radius: hit_radius.unwrap_or(defaults.hit_radius),
        },
    ))
}

fn parse_path_def(
    cx: &DocContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<PathDefinition, ContentCompileError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut def_name: Option<String> = None;
    let mut duration: Option<f32> = None;
    let mut waypoints: Option<Vec<Vec3>> = None;
    let mut look_at: Option<Vec3> = None;
    let mut spawn_triggers = Vec::<SpawnTrigger>::new();

    for field in element_children(node) {
        let field_name = claim_field(cx, &mut seen_fields, field, "PathDef")?;
        match field_name.as_str() {
            "defName" => def_name = Some(required_text(cx, field, "defName")?),
            "duration" => duration = Some(parse_positive_f32(cx, field, "duration")?),
            "waypoints" => {
                let points = parse_point_list(cx, field, "waypoints")?;
                if points.is_empty() {
                    return Err(cx.error_at(
                        ContentErrorCode::InvalidValue,
                        "waypoints needs at least 1 point".to_string(),
                        field,
                    ));
                }
                waypoints = Some(points);
            }
            "lookAt" => look_at = Some(parse_vec3(cx, field, "lookAt")?),
            "spawnTriggers" => {
                for item in list_items(cx, field, "spawnTriggers")? {
                    spawn_triggers.push(parse_spawn_trigger(cx, item)?);
                }
            }
            _ => return Err(unknown_field(cx, field, "PathDef")),
        }
    }

    let Some(def_name) = def_name else {
        return Err(missing_field(cx, node, "defName", "PathDef"));
    };
    let Some(duration_seconds) = duration else {
        return Err(missing_field(cx, node, "duration", "PathDef"));
    };
    let Some(waypoints) = waypoints else {
        return Err(missing_field(cx, node, "waypoints", "PathDef"));
    };

    Ok(PathDefinition {
        id: def_name,
        waypoints,
        duration_seconds,
        look_at,
        spawn_triggers,
    })
}

fn parse_spawn_trigger(
    cx: &DocContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<SpawnTrigger, ContentCompileError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut progress: Option<f32> = None;
    let mut kind: Option<EnemyKind> = None;
    let mut position: Option<Vec3> = None;
    let mut sub_path = Vec::new();

    for field in element_children(node) {
        let field_name = claim_field(cx, &mut seen_fields, field, "spawn trigger")?;
        match field_name.as_str() {
            "progress" => {
                let value = parse_f32(cx, field, "progress")?;
                if !(0.0..=1.0).contains(&value) {
                    return Err(cx.error_at(
                        ContentErrorCode::InvalidValue,
                        format!("progress {value} must be within [0, 1]"),
                        field,
                    ));
                }
                progress = Some(value);
            }
            "kind" => kind = Some(parse_enemy_kind(cx, field)?),
            "position" => position = Some(parse_vec3(cx, field, "position")?),
            "subPath" => sub_path = parse_point_list(cx, field, "subPath")?,
            _ => return Err(unknown_field(cx, field, "spawn trigger")),
        }
    }

    let Some(progress) = progress else {
        return Err(missing_field(cx, node, "progress", "spawn trigger"));
    };
    let Some(kind) = kind else {
        return Err(missing_field(cx, node, "kind", "spawn trigger"));
    };
    let Some(position) = position else {
        return Err(missing_field(cx, node, "position", "spawn trigger"));
    };

    Ok(SpawnTrigger {
        progress,
        kind,
        position,
        sub_path,
    })
}

fn parse_scene_def(
    cx: &DocContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<PendingScene, ContentCompileError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut def_name: Option<String> = None;
    let mut title: Option<String> = None;
    let mut camera_position: Option<Vec3> = None;
    let mut camera_look_at: Option<Vec3> = None;
    let mut path_refs = Vec::new();
    let mut spawns = Vec::new();
    let mut power_ups = Vec::new();

    for field in element_children(node) {
        let field_name = claim_field(cx, &mut seen_fields, field, "SceneDef")?;
        match field_name.as_str() {
            "defName" => def_name = Some(required_text(cx, field, "defName")?),
            "title" => title = Some(required_text(cx, field, "title")?),
            "cameraPosition" => camera_position = Some(parse_vec3(cx, field, "cameraPosition")?),
            "cameraLookAt" => camera_look_at = Some(parse_vec3(cx, field, "cameraLookAt")?),
            "paths" => {
                for item in list_items(cx, field, "paths")? {
                    path_refs.push((required_text(cx, item, "li")?, cx.location(item)));
                }
            }
            "spawns" => {
                for item in list_items(cx, field, "spawns")? {
                    spawns.push(parse_scene_spawn(cx, item)?);
                }
            }
            "powerUps" => {
                for item in list_items(cx, field, "powerUps")? {
                    power_ups.push(parse_power_up(cx, item)?);
                }
            }
            _ => return Err(unknown_field(cx, field, "SceneDef")),
        }
    }

    let Some(def_name) = def_name else {
        return Err(missing_field(cx, node, "defName", "SceneDef"));
    };
    let Some(camera_position) = camera_position else {
        return Err(missing_field(cx, node, "cameraPosition", "SceneDef"));
    };
    let Some(camera_look_at) = camera_look_at else {
        return Err(missing_field(cx, node, "cameraLookAt", "SceneDef"));
    };

    Ok(PendingScene {
        title: title.unwrap_or_else(|| def_name.clone()),
        id: def_name,
        camera_position,
        camera_look_at,
        path_refs,
        spawns,
        power_ups,
        location: cx.location(node),
    })
}

fn parse_scene_spawn(
    cx: &DocContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<SceneSpawn, ContentCompileError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut kind: Option<EnemyKind> = None;
    let mut position: Option<Vec3> = None;
    let mut sub_path = Vec::new();

    for field in element_children(node) {
        let field_name = claim_field(cx, &mut seen_fields, field, "spawn")?;
        match field_name.as_str() {
            "kind" => kind = Some(parse_enemy_kind(cx, field)?),
            "position" => position = Some(parse_vec3(cx, field, "position")?),
            "subPath" => sub_path = parse_point_list(cx, field, "subPath")?,
            _ => return Err(unknown_field(cx, field, "spawn")),
        }
    }

    let Some(kind) = kind else {
        return Err(missing_field(cx, node, "kind", "spawn"));
    };
    let Some(position) = position else {
        return Err(missing_field(cx, node, "position", "spawn"));
    };
    Ok(SceneSpawn {
        kind,
        position,
        sub_path,
    })
}

fn parse_power_up(
    cx: &DocContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<PowerUpPlacement, ContentCompileError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut kind: Option<PowerUpKind> = None;
    let mut position: Option<Vec3> = None;

    for field in element_children(node) {
        let field_name = claim_field(cx, &mut seen_fields, field, "power-up")?;
        match field_name.as_str() {
            "kind" => {
                let value = required_text(cx, field, "kind")?;
                let Some(parsed) = PowerUpKind::from_token(&value) else {
                    let allowed = PowerUpKind::ALL.map(PowerUpKind::as_token).join(", ");
                    return Err(cx.error_at(
                        ContentErrorCode::InvalidValue,
                        format!("invalid power-up kind '{value}'; allowed values: {allowed}"),
                        field,
                    ));
                };
                kind = Some(parsed);
            }
            "position" => position = Some(parse_vec3(cx, field, "position")?),
            _ => return Err(unknown_field(cx, field, "power-up")),
        }
    }

    let Some(kind) = kind else {
        return Err(missing_field(cx, node, "kind", "power-up"));
    };
    let Some(position) = position else {
        return Err(missing_field(cx, node, "position", "power-up"));
    };
    Ok(PowerUpPlacement { kind, position })
}

fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|child| child.is_element())
}

fn claim_field(
    cx: &DocContext<'_, '_>,
    seen_fields: &mut HashSet<String>,
    field: Node<'_, '_>,
    owner: &str,
) -> Result<String, ContentCompileError> {
    let field_name = field.tag_name().name().to_string();
    if !seen_fields.insert(field_name.clone()) {
        return Err(cx.error_at(
            ContentErrorCode::DuplicateField,
            format!("duplicate field <{field_name}> in <{owner}>"),
            field,
        ));
    }
    Ok(field_name)
}

fn list_items<'a, 'input>(
    cx: &DocContext<'_, '_>,
    node: Node<'a, 'input>,
    field_name: &str,
) -> Result<Vec<Node<'a, 'input>>, ContentCompileError> {
    let mut items = Vec::new();
    for child in element_children(node) {
        if child.tag_name().name() != "li" {
            return Err(cx.error_at(
                ContentErrorCode::UnknownField,
                format!(
                    "<{field_name}> may only contain <li> items, found <{}>",
                    child.tag_name().name()
                ),
                child,
            ));
        }
        items.push(child);
    }
    Ok(items)
}

fn parse_point_list(
    cx: &DocContext<'_, '_>,
    node: Node<'_, '_>,
    field_name: &str,
) -> Result<Vec<Vec3>, ContentCompileError> {
    list_items(cx, node, field_name)?
        .into_iter()
        .map(|item| parse_vec3(cx, item, field_name))
        .collect()
}

fn parse_enemy_kind(
    cx: &DocContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<EnemyKind, ContentCompileError> {
    let value = required_text(cx, node, "kind")?;
    EnemyKind::from_token(&value).ok_or_else(|| {
        let allowed = EnemyKind::ALL.map(EnemyKind::as_token).join(", ");
        cx.error_at(
            ContentErrorCode::InvalidValue,
            format!("invalid enemy kind '{value}'; allowed values: {allowed}"),
            node,
        )
    })
}

/// Accepts `x y z` or `x, y, z`.
fn parse_vec3(
    cx: &DocContext<'_, '_>,
    node: Node<'_, '_>,
    field_name: &str,
) -> Result<Vec3, ContentCompileError> {
    let value = required_text(cx, node, field_name)?;
    let parts = value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(str::parse::<f32>)
        .collect::<Result<Vec<_>, _>>();
    match parts.as_deref() {
        Ok([x, y, z]) if x.is_finite() && y.is_finite() && z.is_finite() => {
            Ok(Vec3::new(*x, *y, *z))
        }
        _ => Err(cx.error_at(
            ContentErrorCode::InvalidValue,
            format!("{field_name} '{value}' is not a point of three finite numbers"),
            node,
        )),
    }
}

fn parse_f32(
    cx: &DocContext<'_, '_>,
    node: Node<'_, '_>,
    field_name: &str,
) -> Result<f32, ContentCompileError> {
    let value = required_text(cx, node, field_name)?;
    match value.parse::<f32>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(cx.error_at(
            ContentErrorCode::InvalidValue,
            format!("{field_name} '{value}' is not a valid number"),
            node,
        )),
    }
}

fn parse_non_negative_f32(
    cx: &DocContext<'_, '_>,
    node: Node<'_, '_>,
    field_name: &str,
) -> Result<f32, ContentCompileError> {
    let parsed = parse_f32(cx, node, field_name)?;
    if parsed < 0.0 {
        return Err(cx.error_at(
            ContentErrorCode::InvalidValue,
            format!("{field_name} must be >= 0"),
            node,
        ));
    }
    Ok(parsed)
}

fn parse_positive_f32(
    cx: &DocContext<'_, '_>,
    node: Node<'_, '_>,
    field_name: &str,
) -> Result<f32, ContentCompileError> {
    let parsed = parse_f32(cx, node, field_name)?;
    if parsed <= 0.0 {
        return Err(cx.error_at(
            ContentErrorCode::InvalidValue,
            format!("{field_name} must be > 0"),
            node,
        ));
    }
    Ok(parsed)
}

fn parse_u32(
    cx: &DocContext<'_, '_>,
    node: Node<'_, '_>,
    field_name: &str,
) -> Result<u32, ContentCompileError> {
    let value = required_text(cx, node, field_name)?;
    value.parse::<u32>().map_err(|_| {
        cx.error_at(
            ContentErrorCode::InvalidValue,
            format!("{field_name} '{value}' is not a valid non-negative integer"),
            node,
        )
    })
}

fn required_text(
    cx: &DocContext<'_, '_>,
    node: Node<'_, '_>,
    field_name: &str,
) -> Result<String, ContentCompileError> {
    let value = node.text().map(str::trim).unwrap_or_default().to_string();
    if value.is_empty() {
        return Err(cx.error_at(
            ContentErrorCode::MissingField,
            format!("field <{field_name}> must not be empty"),
            node,
        ));
    }
    Ok(value)
}

fn unknown_field(
    cx: &DocContext<'_, '_>,
    field: Node<'_, '_>,
    owner: &str,
) -> ContentCompileError {
    cx.error_at(
        ContentErrorCode::UnknownField,
        format!("unknown field <{}> in <{owner}>", field.tag_name().name()),
        field,
    )
}

fn missing_field(
    cx: &DocContext<'_, '_>,
    node: Node<'_, '_>,
    field_name: &str,
    owner: &str,
) -> ContentCompileError {
    cx.error_at(
        ContentErrorCode::MissingField,
        format!("missing required field <{field_name}> in <{owner}>"),
        node,
    )
}
