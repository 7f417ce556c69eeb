use crate::errors::AppError;
use crate::models::{
    DayRecord, DayView, DeedView, DuaEntry, DuaView, Prayer, ProfileResponse,
    QuranProgressResponse, RamadanTotals, StatsResponse, Summary, UserData,
};
use crate::scoring::{DeedDraft, ValidationError};
use crate::stats::{build_profile, build_stats_at, date_key, day_view, summarize};
use crate::store::{DocumentStore, StoreError, Subscription};
use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct Tracker {
    store: Arc<dyn DocumentStore>,
}

impl Tracker {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn user(&self, uid: &str) -> Result<UserData, AppError> {
        let snapshot = self.store.get(&user_path(uid)).await?;
        Ok(UserData::from_snapshot(snapshot).map_err(StoreError::from)?)
    }

    pub async fn day(&self, uid: &str, date: NaiveDate) -> Result<DayView, AppError> {
        let key = date_key(date);
        let snapshot = self.store.get(&format!("{}/days/{key}", user_path(uid))).await?;
        let day = if snapshot.is_null() {
            DayRecord::default()
        } else {
            serde_json::from_value(snapshot).map_err(StoreError::from)?
        };
        Ok(day_view(&key, &day))
    }

    pub async fn record_prayer(
        &self,
        uid: &str,
        date: NaiveDate,
        prayer: Prayer,
    ) -> Result<DayView, AppError> {
        let key = date_key(date);
        let data = self
            .mutate(uid, {
                let key = key.clone();
                move |data| {
                    data.days.entry(key).or_default().mark_prayer(prayer);
                    Ok(())
                }
            })
            .await?;
        info!(user = uid, %prayer, date = %key, "prayer recorded");
        Ok(view_of(&data, &key))
    }

    pub async fn revoke_prayer(
        &self,
        uid: &str,
        date: NaiveDate,
        prayer: Prayer,
    ) -> Result<DayView, AppError> {
        let key = date_key(date);
        let data = self
            .mutate(uid, {
                let key = key.clone();
                move |data| {
                    if let Some(day) = data.days.get_mut(&key) {
                        day.revoke_prayer(prayer);
                    }
                    Ok(())
                }
            })
            .await?;
        info!(user = uid, %prayer, date = %key, "prayer revoked");
        Ok(view_of(&data, &key))
    }

    pub async fn toggle_prayer(
        &self,
        uid: &str,
        date: NaiveDate,
        prayer: Prayer,
    ) -> Result<DayView, AppError> {
        let key = date_key(date);
        let data = self
            .mutate(uid, {
                let key = key.clone();
                move |data| {
                    let day = data.days.entry(key).or_default();
                    if !day.mark_prayer(prayer) {
                        day.revoke_prayer(prayer);
                    }
                    Ok(())
                }
            })
            .await?;
        debug!(user = uid, %prayer, date = %key, "prayer toggled");
        Ok(view_of(&data, &key))
    }

    pub async fn add_deed(
        &self,
        uid: &str,
        date: NaiveDate,
        draft: DeedDraft,
    ) -> Result<DeedView, AppError> {
        let key = date_key(date);
        let id = Uuid::new_v4().to_string();
        let entry = draft.into_entry(now_millis());

        self.mutate(uid, {
            let (key, id, entry) = (key.clone(), id.clone(), entry.clone());
            move |data| {
                data.days.entry(key).or_default().deeds.insert(id, entry);
                Ok(())
            }
        })
        .await?;
        info!(user = uid, date = %key, points = entry.points, "deed added");

        Ok(DeedView {
            id,
            description: entry.description,
            points: entry.points,
            kind: entry.kind,
            created_at: entry.created_at,
        })
    }

    pub async fn edit_deed(
        &self,
        uid: &str,
        date: NaiveDate,
        id: &str,
        draft: DeedDraft,
    ) -> Result<DeedView, AppError> {
        let key = date_key(date);
        let data = self
            .mutate(uid, {
                let (key, id) = (key.clone(), id.to_string());
                move |data| {
                    data.days
                        .get_mut(&key)
                        .and_then(|day| day.edit_deed(&id, draft))
                        .map(|_| ())
                        .ok_or_else(|| StoreError::NotFound(format!("deed {id}")))
                }
            })
            .await?;
        info!(user = uid, date = %key, deed = id, "deed edited");

        let entry = data
            .days
            .get(&key)
            .and_then(|day| day.deeds.get(id))
            .ok_or_else(|| AppError::not_found(format!("deed {id} not found")))?;
        Ok(DeedView {
            id: id.to_string(),
            description: entry.description.clone(),
            points: entry.points,
            kind: entry.kind,
            created_at: entry.created_at,
        })
    }

    pub async fn delete_deed(&self, uid: &str, date: NaiveDate, id: &str) -> Result<DayView, AppError> {
        let key = date_key(date);
        let data = self
            .mutate(uid, {
                let (key, id) = (key.clone(), id.to_string());
                move |data| {
                    data.days
                        .get_mut(&key)
                        .and_then(|day| day.deeds.remove(&id))
                        .map(|_| ())
                        .ok_or_else(|| StoreError::NotFound(format!("deed {id}")))
                }
            })
            .await?;
        info!(user = uid, date = %key, deed = id, "deed deleted");
        Ok(view_of(&data, &key))
    }

    pub async fn summary(&self, uid: &str) -> Result<Summary, AppError> {
        Ok(summarize(&self.user(uid).await?.days))
    }

    pub async fn profile(&self, uid: &str) -> Result<ProfileResponse, AppError> {
        Ok(build_profile(&self.user(uid).await?.days))
    }

    pub async fn stats(&self, uid: &str, today: NaiveDate) -> Result<StatsResponse, AppError> {
        Ok(build_stats_at(today, &self.user(uid).await?.days))
    }

    pub async fn totals(&self, uid: &str) -> Result<RamadanTotals, AppError> {
        Ok(self.user(uid).await?.ramadan_totals)
    }

    pub async fn duas(&self, uid: &str) -> Result<Vec<DuaView>, AppError> {
        let data = self.user(uid).await?;
        let mut duas: Vec<DuaView> = data
            .duas
            .into_iter()
            .map(|(id, dua)| DuaView {
                id,
                text: dua.text,
                created_at: dua.created_at,
            })
            .collect();
        duas.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(duas)
    }

    pub async fn add_dua(&self, uid: &str, text: &str) -> Result<DuaView, AppError> {
        let text = dua_text(text)?;
        let id = Uuid::new_v4().to_string();
        let entry = DuaEntry {
            text,
            created_at: now_millis(),
        };

        self.mutate(uid, {
            let (id, entry) = (id.clone(), entry.clone());
            move |data| {
                data.duas.insert(id, entry);
                Ok(())
            }
        })
        .await?;
        debug!(user = uid, dua = %id, "dua added");

        Ok(DuaView {
            id,
            text: entry.text,
            created_at: entry.created_at,
        })
    }

    pub async fn edit_dua(&self, uid: &str, id: &str, text: &str) -> Result<DuaView, AppError> {
        let text = dua_text(text)?;
        let data = self
            .mutate(uid, {
                let (id, text) = (id.to_string(), text.clone());
                move |data| {
                    let dua = data
                        .duas
                        .get_mut(&id)
                        .ok_or_else(|| StoreError::NotFound(format!("dua {id}")))?;
                    dua.text = text;
                    Ok(())
                }
            })
            .await?;
        debug!(user = uid, dua = id, "dua edited");

        let dua = data
            .duas
            .get(id)
            .ok_or_else(|| AppError::not_found(format!("dua {id} not found")))?;
        Ok(DuaView {
            id: id.to_string(),
            text: dua.text.clone(),
            created_at: dua.created_at,
        })
    }

    pub async fn delete_dua(&self, uid: &str, id: &str) -> Result<(), AppError> {
        self.mutate(uid, {
            let id = id.to_string();
            move |data| {
                data.duas
                    .remove(&id)
                    .map(|_| ())
                    .ok_or_else(|| StoreError::NotFound(format!("dua {id}")))
            }
        })
        .await?;
        debug!(user = uid, dua = id, "dua deleted");
        Ok(())
    }

    pub async fn quran_progress(&self, uid: &str) -> Result<QuranProgressResponse, AppError> {
        let days = self.user(uid).await?.quran;
        Ok(quran_response(days))
    }

    /// Sets the pages read for a surah on `date`, replacing any earlier value
    /// for the same surah and day.
    pub async fn mark_quran(
        &self,
        uid: &str,
        date: NaiveDate,
        surah: &str,
        pages: u32,
    ) -> Result<QuranProgressResponse, AppError> {
        let surah = surah.trim();
        if surah.is_empty() {
            return Err(ValidationError::MissingSurah.into());
        }
        if pages == 0 {
            return Err(ValidationError::InvalidPages.into());
        }
        crate::store::parse_path(surah)
            .ok()
            .filter(|segments| segments.len() == 1)
            .ok_or(ValidationError::MissingSurah)?;

        let key = date_key(date);
        let data = self
            .mutate(uid, {
                let (key, surah) = (key.clone(), surah.to_string());
                move |data| {
                    data.quran.entry(key).or_default().insert(surah, pages);
                    Ok(())
                }
            })
            .await?;
        info!(user = uid, date = %key, surah, pages, "quran reading marked");
        Ok(quran_response(data.quran))
    }

    pub async fn delete_quran_entry(
        &self,
        uid: &str,
        date: NaiveDate,
        surah: &str,
    ) -> Result<QuranProgressResponse, AppError> {
        let key = date_key(date);
        let data = self
            .mutate(uid, {
                let (key, surah) = (key.clone(), surah.to_string());
                move |data| {
                    let day = data
                        .quran
                        .get_mut(&key)
                        .ok_or_else(|| StoreError::NotFound(format!("quran entry {key}")))?;
                    day.remove(&surah)
                        .ok_or_else(|| StoreError::NotFound(format!("quran entry {key}/{surah}")))?;
                    if day.is_empty() {
                        data.quran.remove(&key);
                    }
                    Ok(())
                }
            })
            .await?;
        debug!(user = uid, date = %key, surah, "quran entry deleted");
        Ok(quran_response(data.quran))
    }

    /// Live view of a path inside the user's document (`""` for all of it).
    pub async fn watch(&self, uid: &str, relative: &str) -> Result<Subscription, AppError> {
        let path = format!("{}/{}", user_path(uid), relative.trim_matches('/'));
        Ok(self.store.subscribe(&path).await?)
    }

    async fn mutate<F>(&self, uid: &str, change: F) -> Result<UserData, AppError>
    where
        F: FnOnce(&mut UserData) -> Result<(), StoreError> + Send + 'static,
    {
        let committed = self
            .store
            .transaction(
                &user_path(uid),
                Box::new(move |current| {
                    let mut data = UserData::from_snapshot(current)?;
                    change(&mut data)?;
                    data.refresh_totals();
                    Ok(serde_json::to_value(&data)?)
                }),
            )
            .await?;
        Ok(UserData::from_snapshot(committed).map_err(StoreError::from)?)
    }
}

fn user_path(uid: &str) -> String {
    format!("users/{uid}")
}

fn view_of(data: &UserData, key: &str) -> DayView {
    match data.days.get(key) {
        Some(day) => day_view(key, day),
        None => day_view(key, &DayRecord::default()),
    }
}

fn dua_text(text: &str) -> Result<String, ValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::EmptyDua);
    }
    Ok(text.to_string())
}

fn quran_response(days: BTreeMap<String, BTreeMap<String, u32>>) -> QuranProgressResponse {
    let total_pages = days
        .values()
        .flat_map(|surahs| surahs.values())
        .map(|pages| u64::from(*pages))
        .sum();
    QuranProgressResponse { days, total_pages }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
