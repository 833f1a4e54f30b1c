use std::collections::BTreeMap;
use std::future::Future;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};
use crate::host::{Component, EntityId, RenderHost};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Spine,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadItem {
    pub url: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
}

impl LoadItem {
    pub fn spine(url: &str) -> Self {
        Self {
            url: url.to_string(),
            asset_type: AssetType::Spine,
        }
    }
}

/// Resolves `http(s)://` URLs, `file://` URLs and plain paths into assets.
///
/// Every load is bounded by the loader's timeout, and any failure comes back
/// as [`Error::AssetLoad`]. Nothing is retried.
#[derive(Debug, Clone)]
pub struct AssetLoader {
    timeout: Duration,
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl AssetLoader {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn load(&self, item: &LoadItem) -> Result<SpineAsset> {
        log::info!("Loading {:?} asset from: {}", item.asset_type, item.url);
        let fetch = Self::fetch(item.url.clone(), self.timeout);
        self.load_from(item, fetch).await
    }

    /// Fetch and parse under one deadline.
    pub(crate) async fn load_from<F>(&self, item: &LoadItem, fetch: F) -> Result<SpineAsset>
    where
        F: Future<Output = Result<Vec<u8>>>,
    {
        let load = async {
            let bytes = fetch.await?;
            log::debug!("Fetched {} bytes from {}", bytes.len(), item.url);

            match item.asset_type {
                AssetType::Spine => SpineAsset::from_slice(&item.url, &bytes),
            }
        };

        match tokio::time::timeout(self.timeout, load).await {
            Ok(asset) => asset,
            Err(_) => Err(Error::asset_load(
                &item.url,
                format!("timed out after {:?}", self.timeout),
            )),
        }
    }

    async fn fetch(url: String, timeout: Duration) -> Result<Vec<u8>> {
        if url.starts_with("http://") || url.starts_with("https://") {
            let task_url = url.clone();
            tokio::task::spawn_blocking(move || fetch_http(&task_url, timeout))
                .await
                .map_err(|e| Error::asset_load(&url, e))?
        } else {
            let path = url.strip_prefix("file://").unwrap_or(&url);
            tokio::fs::read(Path::new(path))
                .await
                .map_err(|e| Error::asset_load(&url, e))
        }
    }
}

fn fetch_http(url: &str, timeout: Duration) -> Result<Vec<u8>> {
    let agent = ureq::AgentBuilder::new().timeout(timeout).build();
    let response = agent
        .get(url)
        .call()
        .map_err(|e| Error::asset_load(url, e))?;

    let mut data = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut data)
        .map_err(|e| Error::asset_load(url, e))?;
    Ok(data)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneData {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub length: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotData {
    pub name: String,
    pub bone: String,
    #[serde(default)]
    pub attachment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationData {
    pub name: String,
    /// Seconds, taken from the latest keyframe time.
    pub duration: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkeletonHeader {
    #[serde(default)]
    pub spine: Option<String>,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
}

#[derive(Deserialize)]
struct SpineJson {
    #[serde(default)]
    skeleton: SkeletonHeader,
    #[serde(default)]
    bones: Vec<BoneData>,
    #[serde(default)]
    slots: Vec<SlotData>,
    #[serde(default)]
    animations: BTreeMap<String, serde_json::Value>,
}

/// Skeleton structure and animation catalogue read from spine JSON.
/// Keyframes are only scanned for durations; nothing is sampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpineSkeletonData {
    pub header: SkeletonHeader,
    pub bones: Vec<BoneData>,
    pub slots: Vec<SlotData>,
    pub animations: Vec<AnimationData>,
}

impl SpineSkeletonData {
    pub fn from_json(json: &[u8]) -> std::result::Result<Self, String> {
        let raw: SpineJson = serde_json::from_slice(json).map_err(|e| e.to_string())?;

        if raw.bones.is_empty() {
            return Err("skeleton has no bones".to_string());
        }
        for bone in &raw.bones {
            if let Some(parent) = &bone.parent {
                if !raw.bones.iter().any(|b| &b.name == parent) {
                    return Err(format!("bone {} references unknown parent {}", bone.name, parent));
                }
            }
        }
        for slot in &raw.slots {
            if !raw.bones.iter().any(|b| b.name == slot.bone) {
                return Err(format!("slot {} references unknown bone {}", slot.name, slot.bone));
            }
        }

        let animations = raw
            .animations
            .iter()
            .map(|(name, timelines)| AnimationData {
                name: name.clone(),
                duration: latest_key_time(timelines),
            })
            .collect();

        Ok(Self {
            header: raw.skeleton,
            bones: raw.bones,
            slots: raw.slots,
            animations,
        })
    }

    pub fn animation(&self, name: &str) -> Option<&AnimationData> {
        self.animations.iter().find(|a| a.name == name)
    }
}

fn latest_key_time(value: &serde_json::Value) -> f32 {
    match value {
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(key, v)| match (key.as_str(), v.as_f64()) {
                ("time", Some(t)) => t as f32,
                _ => latest_key_time(v),
            })
            .fold(0.0, f32::max),
        serde_json::Value::Array(items) => items.iter().map(latest_key_time).fold(0.0, f32::max),
        _ => 0.0,
    }
}

#[derive(Debug, Clone)]
pub struct SpineAsset {
    url: String,
    data: Arc<SpineSkeletonData>,
}

impl SpineAsset {
    pub fn from_slice(url: &str, json: &[u8]) -> Result<Self> {
        let data = SpineSkeletonData::from_json(json).map_err(|reason| Error::asset_load(url, reason))?;
        log::debug!(
            "Parsed spine skeleton {}: {} bones, {} slots, {} animations",
            url,
            data.bones.len(),
            data.slots.len(),
            data.animations.len()
        );
        Ok(Self {
            url: url.to_string(),
            data: Arc::new(data),
        })
    }

    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[inline]
    pub fn data(&self) -> &SpineSkeletonData {
        &self.data
    }

    /// Name of the entity this asset instantiates as: the file stem of the URL.
    pub fn entity_name(&self) -> &str {
        let file = self.url.rsplit('/').next().unwrap_or(&self.url);
        file.split('.').next().filter(|s| !s.is_empty()).unwrap_or("spine")
    }

    pub fn animation(&self) -> SpineAnimation {
        SpineAnimation::new(self.data.clone())
    }

    /// Create a detached entity named after the asset, carrying `animation`
    /// (usually obtained from [`SpineAsset::animation`] and configured).
    pub fn instantiate<H: RenderHost + ?Sized>(&self, host: &mut H, animation: SpineAnimation) -> Result<EntityId> {
        let entity = host.create_root_entity(self.entity_name());
        host.add_component(entity, Component::SpineAnimation(animation))?;
        Ok(entity)
    }
}

#[derive(Debug, Clone)]
pub struct Skeleton {
    pub scale_x: f32,
    pub scale_y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackEntry {
    pub animation: String,
    pub looping: bool,
    pub track_time: f32,
    pub duration: f32,
}

impl TrackEntry {
    pub fn is_complete(&self) -> bool {
        !self.looping && self.track_time >= self.duration
    }
}

#[derive(Debug, Clone)]
pub struct AnimationState {
    data: Arc<SpineSkeletonData>,
    tracks: Vec<Option<TrackEntry>>,
}

impl AnimationState {
    /// Replace whatever plays on `track` with the named animation.
    pub fn set_animation(&mut self, track: usize, name: &str, looping: bool) -> Result<&TrackEntry> {
        let animation = self
            .data
            .animation(name)
            .ok_or_else(|| Error::UnknownAnimation(name.to_string()))?;
        let entry = TrackEntry {
            animation: animation.name.clone(),
            looping,
            track_time: 0.0,
            duration: animation.duration,
        };

        if self.tracks.len() <= track {
            self.tracks.resize(track + 1, None);
        }
        Ok(&*self.tracks[track].insert(entry))
    }

    pub fn track(&self, track: usize) -> Option<&TrackEntry> {
        self.tracks.get(track).and_then(Option::as_ref)
    }

    pub fn clear_track(&mut self, track: usize) {
        if let Some(slot) = self.tracks.get_mut(track) {
            *slot = None;
        }
    }

    /// Advance every track's clock; looping tracks wrap at their duration.
    pub fn update(&mut self, delta: f32) {
        for entry in self.tracks.iter_mut().flatten() {
            entry.track_time += delta;
            if entry.duration > 0.0 {
                if entry.looping {
                    entry.track_time %= entry.duration;
                } else {
                    entry.track_time = entry.track_time.min(entry.duration);
                }
            }
        }
    }
}

/// Control surface of a spine entity: the skeleton and its animation state.
#[derive(Debug, Clone)]
pub struct SpineAnimation {
    pub skeleton: Skeleton,
    pub state: AnimationState,
}

impl SpineAnimation {
    pub fn new(data: Arc<SpineSkeletonData>) -> Self {
        Self {
            skeleton: Skeleton {
                scale_x: 1.0,
                scale_y: 1.0,
            },
            state: AnimationState {
                data,
                tracks: Vec::new(),
            },
        }
    }

    pub fn update(&mut self, delta: f32) {
        self.state.update(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKELETON: &str = r#"{
        "skeleton": { "spine": "4.1.17", "width": 470.0, "height": 731.0 },
        "bones": [
            { "name": "root" },
            { "name": "hip", "parent": "root", "length": 12.5 }
        ],
        "slots": [ { "name": "body", "bone": "hip", "attachment": "body" } ],
        "animations": {
            "walk": { "bones": { "hip": { "rotate": [ { "value": 1.0 }, { "time": 0.5, "value": 3.0 }, { "time": 1.0 } ] } } },
            "idle": { "slots": { "body": { "rgba": [ { "time": 2.0, "color": "ffffffff" } ] } } }
        }
    }"#;

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("bufmesh_{}_{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn parses_skeleton_and_durations() {
        let asset = SpineAsset::from_slice("https://host/assets/spineboy-pro.json", SKELETON.as_bytes()).unwrap();
        let data = asset.data();

        assert_eq!(data.header.spine.as_deref(), Some("4.1.17"));
        assert_eq!(data.bones.len(), 2);
        assert_eq!(data.slots[0].bone, "hip");
        assert_eq!(data.animation("walk").unwrap().duration, 1.0);
        assert_eq!(data.animation("idle").unwrap().duration, 2.0);
        assert_eq!(asset.entity_name(), "spineboy-pro");
    }

    #[test]
    fn rejects_dangling_references() {
        let json = r#"{ "bones": [ { "name": "hip", "parent": "nowhere" } ] }"#;
        let err = SpineAsset::from_slice("bad.json", json.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::AssetLoad { ref url, .. } if url == "bad.json"));

        let json = r#"{ "bones": [ { "name": "root" } ], "slots": [ { "name": "s", "bone": "arm" } ] }"#;
        assert!(SpineAsset::from_slice("bad.json", json.as_bytes()).is_err());
    }

    #[test]
    fn set_animation_checks_names() {
        let asset = SpineAsset::from_slice("a.json", SKELETON.as_bytes()).unwrap();
        let mut spine = asset.animation();

        let entry = spine.state.set_animation(2, "walk", true).unwrap();
        assert_eq!(entry.animation, "walk");
        assert!(spine.state.track(0).is_none());
        assert!(spine.state.track(2).is_some());

        assert!(matches!(
            spine.state.set_animation(0, "run", true),
            Err(Error::UnknownAnimation(ref name)) if name == "run"
        ));
    }

    #[test]
    fn update_wraps_looping_and_clamps_one_shot() {
        let asset = SpineAsset::from_slice("a.json", SKELETON.as_bytes()).unwrap();
        let mut spine = asset.animation();
        spine.state.set_animation(0, "walk", true).unwrap();
        spine.state.set_animation(1, "idle", false).unwrap();

        spine.update(1.25);
        assert!((spine.state.track(0).unwrap().track_time - 0.25).abs() < 1e-6);
        spine.update(1.0);
        assert!(spine.state.track(1).unwrap().is_complete());

        spine.state.clear_track(1);
        assert!(spine.state.track(1).is_none());
    }

    #[tokio::test]
    async fn loads_spine_from_file() {
        let path = temp_file("skeleton.json", SKELETON);
        let loader = AssetLoader::default();

        let asset = loader.load(&LoadItem::spine(path.to_str().unwrap())).await.unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(asset.data().animations.len(), 2);
    }

    #[tokio::test]
    async fn file_url_prefix_is_accepted() {
        let path = temp_file("skeleton_url.json", SKELETON);
        let url = format!("file://{}", path.display());

        let asset = AssetLoader::default().load(&LoadItem::spine(&url)).await.unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(asset.url(), url);
    }

    #[tokio::test]
    async fn missing_file_is_a_load_error() {
        let item = LoadItem::spine("/definitely/not/here/skeleton.json");
        let err = AssetLoader::default().load(&item).await.unwrap_err();
        assert!(matches!(err, Error::AssetLoad { .. }));
    }

    #[tokio::test]
    async fn malformed_json_is_a_load_error() {
        let path = temp_file("broken.json", "{ not json");
        let err = AssetLoader::default().load(&LoadItem::spine(path.to_str().unwrap())).await.unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, Error::AssetLoad { .. }));
    }

    #[tokio::test]
    async fn stalled_fetch_times_out() {
        let loader = AssetLoader::new(Duration::from_millis(20));
        let item = LoadItem::spine("https://example.invalid/stalled.json");

        let err = loader
            .load_from(&item, std::future::pending::<Result<Vec<u8>>>())
            .await
            .unwrap_err();
        match err {
            Error::AssetLoad { url, reason } => {
                assert_eq!(url, item.url);
                assert!(reason.contains("timed out"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn deadline_covers_fetch_and_parse() {
        let loader = AssetLoader::new(Duration::from_millis(20));
        let item = LoadItem::spine("spineboy.json");

        let quick = async { Ok::<_, Error>(SKELETON.as_bytes().to_vec()) };
        let asset = loader.load_from(&item, quick).await.unwrap();
        assert_eq!(asset.entity_name(), "spineboy");

        let late = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, Error>(SKELETON.as_bytes().to_vec())
        };
        let err = loader.load_from(&item, late).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
