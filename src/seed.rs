// ABOUTME: Development fixture set for the CRM database
// ABOUTME: Upserts tenant, user, membership, customer record and contact in dependency order

use crate::error::AdminResult;
use serde_json::{json, Value};
use tokio_postgres::Transaction;

pub const DEV_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";
pub const DEV_USER_ID: &str = "00000000-0000-0000-0000-000000000002";
pub const DEV_USER_EMAIL: &str = "dev@ascendore.local";

#[derive(Debug, Clone)]
pub struct TenantFixture {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub settings: Value,
    pub metadata: Value,
}

#[derive(Debug, Clone)]
pub struct UserFixture {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct CustomerFixture {
    pub name: String,
    pub slug: String,
    pub industry: String,
    pub company_size: String,
    pub company_status: String,
    pub tags: Value,
    pub custom_fields: Value,
}

#[derive(Debug, Clone)]
pub struct ContactFixture {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub title: String,
    pub contact_status: String,
    pub lead_score: i32,
    pub tags: Value,
}

/// The complete fixture set loaded by `seed`.
#[derive(Debug, Clone)]
pub struct Fixtures {
    pub tenant: TenantFixture,
    pub user: UserFixture,
    pub membership_role: String,
    pub customer: CustomerFixture,
    pub contact: ContactFixture,
}

impl Default for Fixtures {
    fn default() -> Self {
        Self {
            tenant: TenantFixture {
                id: DEV_TENANT_ID.to_string(),
                name: "Dev Company".to_string(),
                slug: "dev-company".to_string(),
                settings: json!({}),
                metadata: json!({}),
            },
            user: UserFixture {
                id: DEV_USER_ID.to_string(),
                email: DEV_USER_EMAIL.to_string(),
                first_name: "Dev".to_string(),
                last_name: "User".to_string(),
                is_active: true,
            },
            membership_role: "owner".to_string(),
            customer: CustomerFixture {
                name: "Acme Corporation".to_string(),
                slug: "acme-corp".to_string(),
                industry: "Technology".to_string(),
                company_size: "enterprise".to_string(),
                company_status: "customer".to_string(),
                tags: json!(["enterprise", "technology"]),
                custom_fields: json!({}),
            },
            contact: ContactFixture {
                first_name: "John".to_string(),
                last_name: "Doe".to_string(),
                email: "john.doe@acme.com".to_string(),
                title: "CTO".to_string(),
                contact_status: "active".to_string(),
                lead_score: 85,
                tags: json!(["decision-maker"]),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    Inserted,
    AlreadyPresent,
    /// The customer insert hit a conflict and returned no id, so the contact was not attempted.
    SkippedNoParent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub tenant_id: String,
    pub user_id: String,
    pub user_email: String,
    pub membership_created: bool,
    /// Id of the customer record, `None` when it already existed.
    pub customer_id: Option<String>,
    pub contact: ContactOutcome,
}

/// Where fixtures are written. Implemented for a PostgreSQL transaction.
#[allow(async_fn_in_trait)]
pub trait SeedTarget {
    async fn upsert_tenant(&mut self, tenant: &TenantFixture) -> AdminResult<()>;

    async fn upsert_user(&mut self, user: &UserFixture) -> AdminResult<()>;

    /// Returns true if a membership row was inserted.
    async fn link_membership(&mut self, tenant_id: &str, user_id: &str, role: &str)
        -> AdminResult<bool>;

    /// Returns the new record's id, or `None` when `(tenant, slug)` already exists.
    async fn insert_customer(
        &mut self,
        tenant_id: &str,
        owner_id: &str,
        customer: &CustomerFixture,
    ) -> AdminResult<Option<String>>;

    /// Returns true if a contact row was inserted.
    async fn insert_contact(
        &mut self,
        tenant_id: &str,
        customer_id: &str,
        owner_id: &str,
        contact: &ContactFixture,
    ) -> AdminResult<bool>;
}

/// Write the fixture set in dependency order.
///
/// Tenant and user come before the membership that references both; the customer
/// record comes before the contact that references it. When the customer insert
/// returns no id the contact step is skipped rather than run with a missing parent.
pub async fn load_fixtures<T: SeedTarget>(
    target: &mut T,
    fixtures: &Fixtures,
) -> AdminResult<SeedReport> {
    let tenant_id = fixtures.tenant.id.as_str();
    let user_id = fixtures.user.id.as_str();

    tracing::info!("1. Creating tenant company '{}'...", fixtures.tenant.name);
    target.upsert_tenant(&fixtures.tenant).await?;
    tracing::info!("✓ Tenant ready");

    tracing::info!("2. Creating user '{}'...", fixtures.user.email);
    target.upsert_user(&fixtures.user).await?;
    tracing::info!("✓ User ready");

    tracing::info!("3. Linking user to tenant as '{}'...", fixtures.membership_role);
    let membership_created = target
        .link_membership(tenant_id, user_id, &fixtures.membership_role)
        .await?;
    if membership_created {
        tracing::info!("✓ Membership created");
    } else {
        tracing::info!("✓ Membership already present");
    }

    tracing::info!("4. Creating customer record '{}'...", fixtures.customer.name);
    let customer_id = target
        .insert_customer(tenant_id, user_id, &fixtures.customer)
        .await?;

    let contact = match customer_id.as_deref() {
        Some(id) => {
            tracing::info!("✓ Customer record created: {}", id);
            tracing::info!("5. Creating contact '{}'...", fixtures.contact.email);
            if target
                .insert_contact(tenant_id, id, user_id, &fixtures.contact)
                .await?
            {
                tracing::info!("✓ Contact created");
                ContactOutcome::Inserted
            } else {
                tracing::info!("✓ Contact already present");
                ContactOutcome::AlreadyPresent
            }
        }
        None => {
            tracing::warn!(
                "⚠ Customer record '{}' already exists; skipping contact '{}'",
                fixtures.customer.slug,
                fixtures.contact.email
            );
            ContactOutcome::SkippedNoParent
        }
    };

    Ok(SeedReport {
        tenant_id: tenant_id.to_string(),
        user_id: user_id.to_string(),
        user_email: fixtures.user.email.clone(),
        membership_created,
        customer_id,
        contact,
    })
}

impl SeedTarget for Transaction<'_> {
    async fn upsert_tenant(&mut self, tenant: &TenantFixture) -> AdminResult<()> {
        self.execute(
            "INSERT INTO public.companies (id, name, slug, settings, metadata)
             VALUES ($1::text::uuid, $2, $3, $4, $5)
             ON CONFLICT (id) DO UPDATE
             SET name = EXCLUDED.name,
                 slug = EXCLUDED.slug",
            &[
                &tenant.id,
                &tenant.name,
                &tenant.slug,
                &tenant.settings,
                &tenant.metadata,
            ],
        )
        .await?;
        Ok(())
    }

    async fn upsert_user(&mut self, user: &UserFixture) -> AdminResult<()> {
        self.execute(
            "INSERT INTO public.users (id, email, first_name, last_name, is_active)
             VALUES ($1::text::uuid, $2, $3, $4, $5)
             ON CONFLICT (email) DO UPDATE
             SET first_name = EXCLUDED.first_name,
                 last_name = EXCLUDED.last_name",
            &[
                &user.id,
                &user.email,
                &user.first_name,
                &user.last_name,
                &user.is_active,
            ],
        )
        .await?;
        Ok(())
    }

    async fn link_membership(
        &mut self,
        tenant_id: &str,
        user_id: &str,
        role: &str,
    ) -> AdminResult<bool> {
        let inserted = self
            .execute(
                "INSERT INTO public.company_users (company_id, user_id, role)
                 VALUES ($1::text::uuid, $2::text::uuid, $3)
                 ON CONFLICT (company_id, user_id) DO NOTHING",
                &[&tenant_id, &user_id, &role],
            )
            .await?;
        Ok(inserted > 0)
    }

    async fn insert_customer(
        &mut self,
        tenant_id: &str,
        owner_id: &str,
        customer: &CustomerFixture,
    ) -> AdminResult<Option<String>> {
        let row = self
            .query_opt(
                "INSERT INTO public.crm_companies (
                     company_id, name, slug, industry, company_size,
                     company_status, owner_id, tags, custom_fields
                 )
                 VALUES ($1::text::uuid, $2, $3, $4, $5, $6, $7::text::uuid, $8, $9)
                 ON CONFLICT (company_id, slug) DO NOTHING
                 RETURNING id::text",
                &[
                    &tenant_id,
                    &customer.name,
                    &customer.slug,
                    &customer.industry,
                    &customer.company_size,
                    &customer.company_status,
                    &owner_id,
                    &customer.tags,
                    &customer.custom_fields,
                ],
            )
            .await?;
        Ok(row.map(|r| r.get(0)))
    }

    async fn insert_contact(
        &mut self,
        tenant_id: &str,
        customer_id: &str,
        owner_id: &str,
        contact: &ContactFixture,
    ) -> AdminResult<bool> {
        let inserted = self
            .execute(
                "INSERT INTO public.crm_contacts (
                     company_id, crm_company_id, first_name, last_name,
                     email, title, contact_status, lead_score,
                     owner_id, tags
                 )
                 VALUES ($1::text::uuid, $2::text::uuid, $3, $4, $5, $6, $7, $8, $9::text::uuid, $10)
                 ON CONFLICT (company_id, email) DO NOTHING",
                &[
                    &tenant_id,
                    &customer_id,
                    &contact.first_name,
                    &contact.last_name,
                    &contact.email,
                    &contact.title,
                    &contact.contact_status,
                    &contact.lead_score,
                    &owner_id,
                    &contact.tags,
                ],
            )
            .await?;
        Ok(inserted > 0)
    }
}
