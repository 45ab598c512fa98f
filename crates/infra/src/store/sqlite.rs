//! SQLite-backed store.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use tracing::{Span, instrument};

use chemstock_core::{Aggregate, DomainError, Entity, InventoryId, MovementId, ProductId};
use chemstock_inventory::{
    AdjustStock, InventoryRecord, MovementRecord, MovementType, Quantity, RegisterProduct,
    StockMoved,
};
use chemstock_products::{ChemicalIdentifier, Product};

use super::{
    InventoryLine, MovementLine, ProductDeletion, ProductRegistration, StockAdjustment,
    StoreError, StoreResult, map_insert_product_error, map_sqlx_error,
};

/// Catalog + ledger + movement log over one SQLite pool.
///
/// Cheap to clone: `SqlitePool` is reference counted.
#[derive(Debug, Clone)]
pub struct InventoryStore {
    pool: SqlitePool,
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    cas_number: String,
    unit: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = DomainError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product::from_parts(
            ProductId::new(row.id),
            row.name,
            ChemicalIdentifier::parse(&row.cas_number)?,
            row.unit,
        ))
    }
}

#[derive(Debug, FromRow)]
struct InventoryRow {
    id: i64,
    product_id: i64,
    current_stock: f64,
}

impl From<InventoryRow> for InventoryRecord {
    fn from(row: InventoryRow) -> Self {
        InventoryRecord::from_parts(
            InventoryId::new(row.id),
            ProductId::new(row.product_id),
            row.current_stock,
        )
    }
}

#[derive(Debug, FromRow)]
struct InventoryLineRow {
    id: i64,
    product_id: i64,
    current_stock: f64,
    name: String,
    cas_number: String,
    unit: String,
}

#[derive(Debug, FromRow)]
struct MovementLineRow {
    id: i64,
    product_id: i64,
    movement_type: String,
    quantity: f64,
    created_at: DateTime<Utc>,
    name: String,
    unit: String,
}

impl TryFrom<MovementLineRow> for MovementLine {
    type Error = DomainError;

    fn try_from(row: MovementLineRow) -> Result<Self, Self::Error> {
        let movement = MovementRecord::from_parts(
            MovementId::new(row.id),
            ProductId::new(row.product_id),
            row.movement_type.parse::<MovementType>()?,
            Quantity::new(row.quantity)?,
            row.created_at,
        );
        Ok(MovementLine {
            movement,
            product_name: row.name,
            unit: row.unit,
        })
    }
}

impl InventoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create a product, its inventory record and its opening IN movement.
    ///
    /// The identifier is checked up front; the `UNIQUE` constraint on
    /// `cas_number` catches a registration that commits in between.
    #[instrument(
        skip(self, cmd),
        fields(identifier = %cmd.product.identifier(), product_id = tracing::field::Empty),
        err(Display)
    )]
    pub async fn register_product(
        &self,
        cmd: &RegisterProduct,
    ) -> StoreResult<ProductRegistration> {
        let identifier = cmd.product.identifier().as_str();
        let mut tx = self.begin().await?;

        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM chemical_products WHERE cas_number = ?1")
                .bind(identifier)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("check_identifier", e))?;
        if existing.is_some() {
            return Err(StoreError::DuplicateIdentifier(identifier.to_string()));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO chemical_products (name, cas_number, unit)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(cmd.product.name())
        .bind(identifier)
        .bind(cmd.product.unit())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_insert_product_error(identifier, e))?;
        let product_id = ProductId::new(inserted.last_insert_rowid());

        let opening = cmd.opening_movement(product_id, Utc::now());

        let inserted = sqlx::query(
            r#"
            INSERT INTO inventory (product_id, current_stock)
            VALUES (?1, ?2)
            "#,
        )
        .bind(product_id.get())
        .bind(opening.delta())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_inventory", e))?;
        let inventory = InventoryRecord::from_parts(
            InventoryId::new(inserted.last_insert_rowid()),
            product_id,
            opening.delta(),
        );

        let movement = insert_movement(&mut tx, &opening).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Span::current().record("product_id", product_id.get());
        tracing::info!(
            initial_quantity = cmd.initial_quantity.get(),
            "product registered"
        );

        Ok(ProductRegistration {
            product: cmd.product.clone().into_product(product_id),
            inventory,
            movement,
        })
    }

    /// Apply an IN/OUT movement to one inventory record.
    #[instrument(
        skip(self, cmd),
        fields(
            inventory_id = %cmd.inventory_id,
            movement_type = %cmd.movement_type,
            quantity = cmd.quantity.get()
        ),
        err(Display)
    )]
    pub async fn adjust_stock(&self, cmd: &AdjustStock) -> StoreResult<StockAdjustment> {
        let mut tx = self.begin().await?;

        let mut record: InventoryRecord = sqlx::query_as::<_, InventoryRow>(
            "SELECT id, product_id, current_stock FROM inventory WHERE id = ?1",
        )
        .bind(cmd.inventory_id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("load_inventory", e))?
        .ok_or(StoreError::NotFound("inventory record"))?
        .into();

        let event = record.handle(cmd)?;
        record.apply(&event);

        sqlx::query("UPDATE inventory SET current_stock = ?1 WHERE id = ?2")
            .bind(record.current_stock())
            .bind(record.id().get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_inventory", e))?;

        let movement = insert_movement(&mut tx, &event).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::info!(
            product_id = %record.product_id(),
            current_stock = record.current_stock(),
            "stock adjusted"
        );

        Ok(StockAdjustment {
            inventory: record,
            movement,
        })
    }

    /// Products ordered by name, optionally filtered by a case-insensitive
    /// substring of the name or the identifier.
    ///
    /// Matching happens here rather than in SQL: SQLite's `LIKE` and
    /// `lower()` fold ASCII case only.
    #[instrument(skip(self), err(Display))]
    pub async fn list_products(&self, search: Option<&str>) -> StoreResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            "SELECT id, name, cas_number, unit FROM chemical_products ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            let product = Product::try_from(row)?;
            if search.is_none_or(|term| product.matches_search(term)) {
                products.push(product);
            }
        }
        Ok(products)
    }

    pub async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row: Option<ProductRow> =
            sqlx::query_as("SELECT id, name, cas_number, unit FROM chemical_products WHERE id = ?1")
                .bind(id.get())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("get_product", e))?;
        Ok(row.map(Product::try_from).transpose()?)
    }

    pub async fn get_inventory(&self, id: InventoryId) -> StoreResult<Option<InventoryRecord>> {
        let row: Option<InventoryRow> =
            sqlx::query_as("SELECT id, product_id, current_stock FROM inventory WHERE id = ?1")
                .bind(id.get())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("get_inventory", e))?;
        Ok(row.map(InventoryRecord::from))
    }

    /// Every inventory record with its product, ordered by product name.
    #[instrument(skip(self), err(Display))]
    pub async fn list_inventory(&self) -> StoreResult<Vec<InventoryLine>> {
        let rows: Vec<InventoryLineRow> = sqlx::query_as(
            r#"
            SELECT i.id, i.product_id, i.current_stock, p.name, p.cas_number, p.unit
            FROM inventory i
            JOIN chemical_products p ON p.id = i.product_id
            ORDER BY p.name, i.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_inventory", e))?;

        Ok(rows
            .into_iter()
            .map(|r| InventoryLine {
                record: InventoryRecord::from_parts(
                    InventoryId::new(r.id),
                    ProductId::new(r.product_id),
                    r.current_stock,
                ),
                product_name: r.name,
                identifier: r.cas_number,
                unit: r.unit,
            })
            .collect())
    }

    /// Movement history, newest first.
    #[instrument(skip(self), err(Display))]
    pub async fn list_movements(&self) -> StoreResult<Vec<MovementLine>> {
        let rows: Vec<MovementLineRow> = sqlx::query_as(
            r#"
            SELECT m.id, m.product_id, m.movement_type, m.quantity, m.created_at,
                   p.name, p.unit
            FROM stock_movements m
            JOIN chemical_products p ON p.id = m.product_id
            ORDER BY m.created_at DESC, m.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_movements", e))?;

        Ok(rows
            .into_iter()
            .map(MovementLine::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Remove a product together with its inventory record and movements.
    #[instrument(skip(self), fields(product_id = %id), err(Display))]
    pub async fn delete_product(&self, id: ProductId) -> StoreResult<ProductDeletion> {
        let mut tx = self.begin().await?;

        let product: Product = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, cas_number, unit FROM chemical_products WHERE id = ?1",
        )
        .bind(id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("load_product", e))?
        .ok_or(StoreError::NotFound("product"))?
        .try_into()?;

        let movements_removed = sqlx::query("DELETE FROM stock_movements WHERE product_id = ?1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_movements", e))?
            .rows_affected();

        sqlx::query("DELETE FROM inventory WHERE product_id = ?1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_inventory", e))?;

        sqlx::query("DELETE FROM chemical_products WHERE id = ?1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::info!(movements_removed, "product deleted");

        Ok(ProductDeletion {
            product,
            movements_removed,
        })
    }

    /// Every transaction here writes, so it takes the write lock up front.
    /// A deferred `BEGIN` that read first would fail with `SQLITE_BUSY` on
    /// upgrade instead of waiting on the busy timeout.
    async fn begin(&self) -> StoreResult<Transaction<'static, Sqlite>> {
        self.pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }
}

async fn insert_movement(
    tx: &mut Transaction<'static, Sqlite>,
    event: &StockMoved,
) -> StoreResult<MovementRecord> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO stock_movements (product_id, movement_type, quantity, created_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(event.product_id.get())
    .bind(event.movement_type.as_str())
    .bind(event.quantity.get())
    .bind(event.occurred_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_movement", e))?;

    Ok(MovementRecord::recorded(
        MovementId::new(inserted.last_insert_rowid()),
        event,
    ))
}
