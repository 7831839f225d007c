use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, Result},
    models::{NewProduct, PriceSort, ProductListQuery, ProductSummary, UpdateProductRequest},
};

/// Build the list query. Every caller-supplied value goes through
/// `push_bind`, so the SQL text and the bind list stay in lockstep; the
/// ORDER BY direction comes from a matched literal, never from input.
fn list_query(params: &ProductListQuery) -> QueryBuilder<'static, Postgres> {
    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT name, price, image_path FROM products WHERE type_id = ");
    query.push_bind(params.type_id);

    // price ceiling
    if let Some(ceiling) = params.filter {
        query.push(" AND price <= ");
        query.push_bind(ceiling);
    }

    // sort
    match params.sort.as_deref().and_then(PriceSort::from_param) {
        Some(PriceSort::Asc) => {
            query.push(" ORDER BY price ASC");
        }
        Some(PriceSort::Desc) => {
            query.push(" ORDER BY price DESC");
        }
        None => {}
    }

    query
}

pub async fn list_products(
    pool: &PgPool,
    params: ProductListQuery,
) -> Result<Vec<ProductSummary>> {
    let mut query = list_query(&params);

    let products = query
        .build_query_as::<ProductSummary>()
        .fetch_all(pool)
        .await?;

    Ok(products)
}

pub async fn create_product(pool: &PgPool, product: &NewProduct) -> Result<()> {
    sqlx::query(
        "INSERT INTO products (name, price, type_id, image_path) VALUES ($1, $2, $3, $4)",
    )
    .bind(&product.name)
    .bind(product.price)
    .bind(product.type_id)
    .bind(&product.image_path)
    .execute(pool)
    .await?;

    Ok(())
}

/// Build the partial update. Fields are appended in a fixed order (name,
/// price, type_id) so the generated text is deterministic; an empty field
/// set errors out before any SQL exists.
fn update_query(req: UpdateProductRequest) -> Result<QueryBuilder<'static, Postgres>> {
    if req.new_name.is_none() && req.new_price.is_none() && req.new_type_id.is_none() {
        return Err(AppError::BadRequest(
            "No fields provided for update".to_string(),
        ));
    }

    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE products SET ");
    let mut has_fields = false;

    if let Some(name) = req.new_name {
        query.push("name = ");
        query.push_bind(name);
        has_fields = true;
    }

    if let Some(price) = req.new_price {
        if has_fields {
            query.push(", ");
        }
        query.push("price = ");
        query.push_bind(price);
        has_fields = true;
    }

    if let Some(type_id) = req.new_type_id {
        if has_fields {
            query.push(", ");
        }
        query.push("type_id = ");
        query.push_bind(type_id);
    }

    query.push(", updated_at = NOW() WHERE name = ");
    query.push_bind(req.match_name);

    Ok(query)
}

/// Returns rows affected; zero means no product carries `match_name`.
pub async fn update_product(pool: &PgPool, req: UpdateProductRequest) -> Result<u64> {
    let mut query = update_query(req)?;

    let result = query.build().execute(pool).await?;

    Ok(result.rows_affected())
}

/// Returns rows affected; zero means the name matched nothing.
pub async fn delete_product(pool: &PgPool, name: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM products WHERE name = $1")
        .bind(name)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn list_params(filter: Option<&str>, sort: Option<&str>) -> ProductListQuery {
        ProductListQuery {
            type_id: 3,
            filter: filter.map(|f| Decimal::from_str(f).unwrap()),
            sort: sort.map(|s| s.to_string()),
        }
    }

    #[test]
    fn list_binds_type_id_only() {
        let query = list_query(&list_params(None, None));
        assert_eq!(
            query.sql(),
            "SELECT name, price, image_path FROM products WHERE type_id = $1"
        );
    }

    #[test]
    fn list_appends_bound_ceiling_when_supplied() {
        let query = list_query(&list_params(Some("25.00"), None));
        assert_eq!(
            query.sql(),
            "SELECT name, price, image_path FROM products WHERE type_id = $1 AND price <= $2"
        );
    }

    #[test]
    fn list_orders_by_price_for_the_two_literals() {
        let asc = list_query(&list_params(None, Some("asc")));
        assert_eq!(
            asc.sql(),
            "SELECT name, price, image_path FROM products WHERE type_id = $1 ORDER BY price ASC"
        );

        let desc = list_query(&list_params(Some("25.00"), Some("desc")));
        assert_eq!(
            desc.sql(),
            "SELECT name, price, image_path FROM products WHERE type_id = $1 AND price <= $2 ORDER BY price DESC"
        );
    }

    #[test]
    fn list_ignores_unknown_sort_values() {
        let query = list_query(&list_params(None, Some("price; DROP TABLE products--")));
        assert_eq!(
            query.sql(),
            "SELECT name, price, image_path FROM products WHERE type_id = $1"
        );
    }

    fn update_req(
        name: Option<&str>,
        price: Option<&str>,
        type_id: Option<i32>,
    ) -> UpdateProductRequest {
        UpdateProductRequest {
            match_name: "Widget".to_string(),
            new_name: name.map(|n| n.to_string()),
            new_price: price.map(|p| Decimal::from_str(p).unwrap()),
            new_type_id: type_id,
        }
    }

    #[test]
    fn update_with_no_fields_fails_before_building_sql() {
        let Err(err) = update_query(update_req(None, None, None)) else {
            panic!("no-field update must fail before building SQL");
        };
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn update_includes_only_supplied_fields() {
        let query = update_query(update_req(None, Some("12.50"), None)).unwrap();
        assert_eq!(
            query.sql(),
            "UPDATE products SET price = $1, updated_at = NOW() WHERE name = $2"
        );
    }

    #[test]
    fn update_field_order_is_deterministic() {
        let query = update_query(update_req(Some("Gadget"), Some("12.50"), Some(4))).unwrap();
        assert_eq!(
            query.sql(),
            "UPDATE products SET name = $1, price = $2, type_id = $3, updated_at = NOW() WHERE name = $4"
        );

        let query = update_query(update_req(Some("Gadget"), None, Some(4))).unwrap();
        assert_eq!(
            query.sql(),
            "UPDATE products SET name = $1, type_id = $2, updated_at = NOW() WHERE name = $3"
        );
    }
}
