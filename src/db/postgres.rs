use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use super::EntryStore;
use crate::{
    models::{
        Animal, AnimalInput, AnimalWeight, FoodEntry, FoodEntryInput, FoodType, FoodTypeFilter,
        FoodTypeInput, User, VitaminEntry, WeightEntry, WeightEntryInput,
    },
    AppError, AppResult,
};

const FOOD_ENTRY_SELECT: &str = r#"
    SELECT
        fe.id,
        fe.food_type_id,
        ft.label AS food_type_label,
        fe.notes,
        fe.created_at,
        fe.user_id,
        u.name AS user_name,
        COALESCE(array_agg(a.id ORDER BY a.name, a.id) FILTER (WHERE a.id IS NOT NULL), '{}')::int4[] AS animal_ids,
        COALESCE(array_agg(a.name ORDER BY a.name, a.id) FILTER (WHERE a.id IS NOT NULL), '{}')::text[] AS animal_names
    FROM food_entry fe
    JOIN food_type ft ON ft.id = fe.food_type_id
    JOIN app_user u ON u.id = fe.user_id
    LEFT JOIN food_entry_animal fea ON fea.food_entry_id = fe.id
    LEFT JOIN animal a ON a.id = fea.animal_id
"#;

const FOOD_ENTRY_GROUP: &str = " GROUP BY fe.id, ft.id, u.id";

const WEIGHT_ENTRY_SELECT: &str = r#"
    SELECT
        w.id,
        w.value,
        w.animal_id,
        a.name AS animal_name,
        w.created_at,
        w.user_id,
        u.name AS user_name
    FROM weight_entry w
    JOIN animal a ON a.id = w.animal_id
    JOIN app_user u ON u.id = w.user_id
"#;

const VITAMIN_ENTRY_SELECT: &str = r#"
    SELECT v.id, v.day, v.created_at, v.user_id, u.name AS user_name
    FROM vitamin_entry v
    JOIN app_user u ON u.id = v.user_id
"#;

#[derive(FromRow)]
struct FoodEntryRow {
    id: i32,
    food_type_id: i32,
    food_type_label: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    user_id: i32,
    user_name: String,
    animal_ids: Vec<i32>,
    animal_names: Vec<String>,
}

impl From<FoodEntryRow> for FoodEntry {
    fn from(row: FoodEntryRow) -> Self {
        let animals = row
            .animal_ids
            .into_iter()
            .zip(row.animal_names)
            .map(|(id, name)| Animal { id, name })
            .collect();

        FoodEntry {
            id: row.id,
            food_type_id: row.food_type_id,
            food_type_label: row.food_type_label,
            notes: row.notes,
            created_at: row.created_at,
            user_id: row.user_id,
            user_name: row.user_name,
            animals,
        }
    }
}

/// Postgres-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn food_type_filter_clause(filter: FoodTypeFilter) -> &'static str {
    match filter {
        FoodTypeFilter::All => "",
        FoodTypeFilter::Visible => " WHERE NOT is_hidden",
        FoodTypeFilter::Eligible => " WHERE included_in_statistics AND NOT is_hidden",
    }
}

async fn link_animals(
    tx: &mut Transaction<'_, Postgres>,
    food_entry_id: i32,
    animal_ids: &[i32],
) -> AppResult<()> {
    if animal_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO food_entry_animal (food_entry_id, animal_id)
        SELECT $1, UNNEST($2::int4[])
        "#,
    )
    .bind(food_entry_id)
    .bind(animal_ids)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[async_trait]
impl EntryStore for PgStore {
    async fn find_or_create_user(&self, name: &str) -> AppResult<User> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO app_user (name) VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user(&self, id: i32) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, name FROM app_user WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn list_animals(&self) -> AppResult<Vec<Animal>> {
        let animals = sqlx::query_as::<_, Animal>("SELECT id, name FROM animal ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;

        Ok(animals)
    }

    async fn get_animal(&self, id: i32) -> AppResult<Option<Animal>> {
        let animal = sqlx::query_as::<_, Animal>("SELECT id, name FROM animal WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(animal)
    }

    async fn create_animal(&self, input: &AnimalInput) -> AppResult<Animal> {
        let animal = sqlx::query_as::<_, Animal>(
            "INSERT INTO animal (name) VALUES ($1) RETURNING id, name",
        )
        .bind(&input.name)
        .fetch_one(&self.pool)
        .await?;

        Ok(animal)
    }

    async fn update_animal(&self, id: i32, input: &AnimalInput) -> AppResult<Option<Animal>> {
        let animal = sqlx::query_as::<_, Animal>(
            "UPDATE animal SET name = $2 WHERE id = $1 RETURNING id, name",
        )
        .bind(id)
        .bind(&input.name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(animal)
    }

    async fn list_food_types(&self, filter: FoodTypeFilter) -> AppResult<Vec<FoodType>> {
        let sql = format!(
            "SELECT id, label, recommendations, included_in_statistics, is_hidden FROM food_type{} ORDER BY label, id",
            food_type_filter_clause(filter)
        );

        let food_types = sqlx::query_as::<_, FoodType>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(food_types)
    }

    async fn get_food_type(&self, id: i32) -> AppResult<Option<FoodType>> {
        let food_type = sqlx::query_as::<_, FoodType>(
            "SELECT id, label, recommendations, included_in_statistics, is_hidden FROM food_type WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(food_type)
    }

    async fn create_food_type(&self, input: &FoodTypeInput) -> AppResult<FoodType> {
        let food_type = sqlx::query_as::<_, FoodType>(
            r#"
            INSERT INTO food_type (label, recommendations, included_in_statistics, is_hidden)
            VALUES ($1, $2, $3, $4)
            RETURNING id, label, recommendations, included_in_statistics, is_hidden
            "#,
        )
        .bind(&input.label)
        .bind(&input.recommendations)
        .bind(input.included_in_statistics)
        .bind(input.is_hidden)
        .fetch_one(&self.pool)
        .await?;

        Ok(food_type)
    }

    async fn update_food_type(
        &self,
        id: i32,
        input: &FoodTypeInput,
    ) -> AppResult<Option<FoodType>> {
        let food_type = sqlx::query_as::<_, FoodType>(
            r#"
            UPDATE food_type
            SET label = $2, recommendations = $3, included_in_statistics = $4, is_hidden = $5
            WHERE id = $1
            RETURNING id, label, recommendations, included_in_statistics, is_hidden
            "#,
        )
        .bind(id)
        .bind(&input.label)
        .bind(&input.recommendations)
        .bind(input.included_in_statistics)
        .bind(input.is_hidden)
        .fetch_optional(&self.pool)
        .await?;

        Ok(food_type)
    }

    async fn query_food_entries(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<FoodEntry>> {
        let sql = format!(
            r#"{}
            WHERE ($1::timestamptz IS NULL OR fe.created_at >= $1)
              AND ($2::timestamptz IS NULL OR fe.created_at < $2)
            {}
            ORDER BY fe.created_at, fe.id"#,
            FOOD_ENTRY_SELECT, FOOD_ENTRY_GROUP
        );

        let rows = sqlx::query_as::<_, FoodEntryRow>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(FoodEntry::from).collect())
    }

    async fn get_food_entry(&self, id: i32) -> AppResult<Option<FoodEntry>> {
        let sql = format!("{} WHERE fe.id = $1 {}", FOOD_ENTRY_SELECT, FOOD_ENTRY_GROUP);

        let row = sqlx::query_as::<_, FoodEntryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(FoodEntry::from))
    }

    async fn create_food_entry(
        &self,
        user_id: i32,
        input: &FoodEntryInput,
        at: DateTime<Utc>,
    ) -> AppResult<FoodEntry> {
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO food_entry (food_type_id, notes, created_at, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(input.food_type_id)
        .bind(&input.notes)
        .bind(at)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        link_animals(&mut tx, id, &input.animal_ids).await?;
        tx.commit().await?;

        self.get_food_entry(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Food entry {} vanished after insert", id)))
    }

    async fn update_food_entry(
        &self,
        id: i32,
        user_id: i32,
        input: &FoodEntryInput,
    ) -> AppResult<Option<FoodEntry>> {
        let mut tx = self.pool.begin().await?;

        let updated: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE food_entry SET food_type_id = $2, notes = $3, user_id = $4
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(input.food_type_id)
        .bind(&input.notes)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            return Ok(None);
        }

        sqlx::query("DELETE FROM food_entry_animal WHERE food_entry_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        link_animals(&mut tx, id, &input.animal_ids).await?;
        tx.commit().await?;

        self.get_food_entry(id).await
    }

    async fn delete_food_entry(&self, id: i32) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM food_entry_animal WHERE food_entry_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM food_entry WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    async fn query_weight_entries(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<WeightEntry>> {
        let sql = format!(
            r#"{}
            WHERE ($1::timestamptz IS NULL OR w.created_at >= $1)
              AND ($2::timestamptz IS NULL OR w.created_at < $2)
            ORDER BY w.created_at, w.id"#,
            WEIGHT_ENTRY_SELECT
        );

        let entries = sqlx::query_as::<_, WeightEntry>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    async fn get_weight_entry(&self, id: i32) -> AppResult<Option<WeightEntry>> {
        let sql = format!("{} WHERE w.id = $1", WEIGHT_ENTRY_SELECT);

        let entry = sqlx::query_as::<_, WeightEntry>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    async fn create_weight_entry(
        &self,
        user_id: i32,
        input: &WeightEntryInput,
        at: DateTime<Utc>,
    ) -> AppResult<WeightEntry> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO weight_entry (value, animal_id, created_at, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(input.value)
        .bind(input.animal_id)
        .bind(at)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        self.get_weight_entry(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Weight entry {} vanished after insert", id)))
    }

    async fn update_weight_entry(
        &self,
        id: i32,
        user_id: i32,
        input: &WeightEntryInput,
    ) -> AppResult<Option<WeightEntry>> {
        let updated: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE weight_entry SET value = $2, animal_id = $3, user_id = $4
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(input.value)
        .bind(input.animal_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(id) => self.get_weight_entry(id).await,
            None => Ok(None),
        }
    }

    async fn most_recent_weight_per_animal(&self) -> AppResult<Vec<AnimalWeight>> {
        let weights = sqlx::query_as::<_, AnimalWeight>(
            r#"
            SELECT DISTINCT ON (a.name, a.id) a.id AS animal_id, a.name, w.value
            FROM animal a
            LEFT JOIN weight_entry w ON w.animal_id = a.id
            ORDER BY a.name, a.id, w.created_at DESC NULLS LAST, w.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(weights)
    }

    async fn query_vitamin_entries(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<VitaminEntry>> {
        let sql = format!(
            r#"{}
            WHERE ($1::timestamptz IS NULL OR v.created_at >= $1)
              AND ($2::timestamptz IS NULL OR v.created_at < $2)
            ORDER BY v.created_at, v.id"#,
            VITAMIN_ENTRY_SELECT
        );

        let entries = sqlx::query_as::<_, VitaminEntry>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    async fn vitamin_entry_for_day(&self, day: NaiveDate) -> AppResult<Option<VitaminEntry>> {
        let sql = format!("{} WHERE v.day = $1", VITAMIN_ENTRY_SELECT);

        let entry = sqlx::query_as::<_, VitaminEntry>(&sql)
            .bind(day)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    async fn delete_vitamin_entries_for_day(&self, day: NaiveDate) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM vitamin_entry WHERE day = $1")
            .bind(day)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn insert_vitamin_entry(
        &self,
        user_id: i32,
        day: NaiveDate,
        at: DateTime<Utc>,
    ) -> AppResult<Option<VitaminEntry>> {
        let entry = sqlx::query_as::<_, VitaminEntry>(
            r#"
            WITH inserted AS (
                INSERT INTO vitamin_entry (day, created_at, user_id)
                VALUES ($1, $2, $3)
                ON CONFLICT (day) DO NOTHING
                RETURNING id, day, created_at, user_id
            )
            SELECT i.id, i.day, i.created_at, i.user_id, u.name AS user_name
            FROM inserted i
            JOIN app_user u ON u.id = i.user_id
            "#,
        )
        .bind(day)
        .bind(at)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, format!("Vitamin already recorded for {}", day)))?;

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_food_entry_row_pairs_animal_ids_with_names() {
        let row = FoodEntryRow {
            id: 7,
            food_type_id: 2,
            food_type_label: "parsley".to_string(),
            notes: Some("a sprig".to_string()),
            created_at: Utc::now(),
            user_id: 1,
            user_name: "anna".to_string(),
            animal_ids: vec![4, 2],
            animal_names: vec!["Butter".to_string(), "Pepper".to_string()],
        };

        let entry = FoodEntry::from(row);
        assert_eq!(entry.animals[0], Animal { id: 4, name: "Butter".to_string() });
        assert_eq!(entry.animal_names(), "Butter, Pepper");
    }

    #[test]
    fn test_food_type_filter_clause() {
        assert_eq!(food_type_filter_clause(FoodTypeFilter::All), "");
        assert!(food_type_filter_clause(FoodTypeFilter::Eligible).contains("included_in_statistics"));
        assert!(food_type_filter_clause(FoodTypeFilter::Visible).contains("NOT is_hidden"));
    }

    /// Store against `TEST_DATABASE_URL`, migrated; `None` when the variable
    /// is unset so the suite still runs without a database.
    async fn test_store() -> Option<PgStore> {
        let url = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) if !url.is_empty() => url,
            _ => {
                eprintln!("TEST_DATABASE_URL not set, skipping Postgres test");
                return None;
            }
        };

        let pool = crate::db::create_pool(&url)
            .await
            .expect("connect to TEST_DATABASE_URL");
        crate::db::run_migrations(&pool).await.expect("run migrations");
        Some(PgStore::new(pool))
    }

    /// Names that don't collide with other tests sharing the database
    fn unique(prefix: &str) -> String {
        format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
    }

    #[tokio::test]
    async fn test_pg_find_or_create_user_is_idempotent() {
        let Some(store) = test_store().await else { return };
        let name = unique("anna");

        let first = store.find_or_create_user(&name).await.unwrap();
        let second = store.find_or_create_user(&name).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.get_user(first.id).await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_pg_latest_weights_include_unweighed_animals() {
        let Some(store) = test_store().await else { return };
        let user = store.find_or_create_user(&unique("anna")).await.unwrap();
        let weighed = store.create_animal(&AnimalInput { name: unique("Pickle") }).await.unwrap();
        let unweighed = store.create_animal(&AnimalInput { name: unique("Butter") }).await.unwrap();

        let earlier = Utc::now() - chrono::TimeDelta::days(1);
        for (value, at) in [(900.0, earlier), (950.0, Utc::now())] {
            store
                .create_weight_entry(user.id, &WeightEntryInput { value, animal_id: weighed.id }, at)
                .await
                .unwrap();
        }

        let weights = store.most_recent_weight_per_animal().await.unwrap();
        let value_of = |id: i32| weights.iter().find(|w| w.animal_id == id).map(|w| w.value);

        assert_eq!(value_of(weighed.id), Some(Some(950.0)));
        assert_eq!(value_of(unweighed.id), Some(None));
    }

    #[tokio::test]
    async fn test_pg_delete_food_entry_clears_associations() {
        let Some(store) = test_store().await else { return };
        let user = store.find_or_create_user(&unique("anna")).await.unwrap();
        let food_type = store
            .create_food_type(&FoodTypeInput {
                label: unique("kale"),
                recommendations: None,
                included_in_statistics: true,
                is_hidden: false,
            })
            .await
            .unwrap();
        let pickle = store.create_animal(&AnimalInput { name: unique("Pickle") }).await.unwrap();
        let butter = store.create_animal(&AnimalInput { name: unique("Butter") }).await.unwrap();

        let input = FoodEntryInput {
            food_type_id: food_type.id,
            notes: Some("fresh".to_string()),
            animal_ids: vec![pickle.id, butter.id],
        };
        let entry = store.create_food_entry(user.id, &input, Utc::now()).await.unwrap();
        assert_eq!(entry.animals.len(), 2);

        let join_rows = || {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM food_entry_animal WHERE food_entry_id = $1",
            )
            .bind(entry.id)
            .fetch_one(&store.pool)
        };
        assert_eq!(join_rows().await.unwrap(), 2);

        assert!(store.delete_food_entry(entry.id).await.unwrap());
        assert_eq!(join_rows().await.unwrap(), 0);
        assert_eq!(store.get_food_entry(entry.id).await.unwrap(), None);
        assert!(!store.delete_food_entry(entry.id).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pg_concurrent_toggles_leave_at_most_one_row() {
        let Some(store) = test_store().await else { return };
        let store = std::sync::Arc::new(store);

        let mut user_ids = Vec::new();
        for _ in 0..4 {
            user_ids.push(store.find_or_create_user(&unique("user")).await.unwrap().id);
        }

        // A day far from any real entries, unique per run
        let day = NaiveDate::from_ymd_opt(1700, 1, 1).unwrap()
            + chrono::Days::new(u64::from(uuid::Uuid::new_v4().as_u128() as u16));
        store.delete_vitamin_entries_for_day(day).await.unwrap();

        let rows = || {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM vitamin_entry WHERE day = $1")
                .bind(day)
                .fetch_one(&store.pool)
        };

        for round in 0..10 {
            let barrier = std::sync::Arc::new(tokio::sync::Barrier::new(user_ids.len()));
            let handles: Vec<_> = user_ids
                .iter()
                .map(|&user_id| {
                    let store = store.clone();
                    let barrier = barrier.clone();
                    tokio::spawn(async move {
                        barrier.wait().await;
                        crate::aggregation::vitamin::toggle_vitamin(
                            store.as_ref(),
                            user_id,
                            day,
                            Utc::now(),
                        )
                        .await
                    })
                })
                .collect();

            for handle in handles {
                handle.await.unwrap().unwrap();
            }

            assert!(rows().await.unwrap() <= 1, "round {}", round);
        }

        store.delete_vitamin_entries_for_day(day).await.unwrap();
    }
}
